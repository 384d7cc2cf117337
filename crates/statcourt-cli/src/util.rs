use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::Path,
};

use anyhow::Context;
use statcourt_analysis::dataset::Dataset;

/// Writes `value` as pretty-printed JSON to `path`, or to stdout without one.
pub fn save_json<T>(value: &T, path: Option<&Path>) -> anyhow::Result<()>
where
    T: serde::Serialize + ?Sized,
{
    let (mut writer, target): (Box<dyn Write>, String) = match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            (Box::new(BufWriter::new(file)), path.display().to_string())
        }
        None => (Box::new(io::stdout().lock()), "stdout".to_owned()),
    };

    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("Failed to write JSON to {target}"))?;
    writeln!(writer)
        .and_then(|()| writer.flush())
        .with_context(|| format!("Failed to flush output to {target}"))?;
    Ok(())
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let value = serde_json::from_reader(BufReader::new(file)).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })?;

    Ok(value)
}

/// Loads a CSV dataset, inferring column types.
pub fn read_dataset<P>(path: P) -> anyhow::Result<Dataset>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    eprintln!("Loading dataset from {}...", path.display());
    let dataset = Dataset::from_csv_path(path)
        .with_context(|| format!("Failed to load dataset: {}", path.display()))?;
    eprintln!(
        "Loaded {} rows, {} columns",
        dataset.row_count(),
        dataset.columns().len()
    );
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use statcourt_analysis::spec::TestSpec;

    use super::*;

    #[test]
    fn test_read_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        fs::write(&path, r#"[{"type": "ttest", "num": "sales", "cat": "city"}]"#).unwrap();

        let specs: Vec<TestSpec> = read_json_file("test plan", &path).unwrap();
        assert_eq!(specs, [TestSpec::mean_difference("sales", "city")]);
    }

    #[test]
    fn test_save_json_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("columns.json");
        save_json(&["sales", "visits"], Some(path.as_path())).unwrap();

        let names: Vec<String> = read_json_file("columns", &path).unwrap();
        assert_eq!(names, ["sales", "visits"]);
    }

    #[test]
    fn test_read_json_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let err = read_json_file::<Vec<TestSpec>, _>("test plan", &path).unwrap_err();
        assert!(err.to_string().contains("Failed to open test plan file"));
    }
}
