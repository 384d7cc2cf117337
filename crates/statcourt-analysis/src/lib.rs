//! Hypothesis-test dispatch and HTML reporting over tabular datasets.
//!
//! This crate turns a dataset and an ordered list of test requests into a
//! single HTML report with one block per test and a summary table.
//!
//! # Overview
//!
//! 1. **Load Data** ([`dataset::Dataset`]): Read a CSV file, inferring numeric
//!    and categorical columns
//! 2. **Describe Tests** ([`spec::TestSpec`]): Chi-square association, Welch's
//!    t-test, or Pearson/Spearman correlation, validated against the dataset
//! 3. **Dispatch** ([`dispatch::Dispatcher`]): Run each test in order, skipping
//!    failures without aborting the run
//! 4. **Compute** ([`adapter`]): Select columns, run the statistics, render a
//!    plot and classify the result ([`result::TestResult`])
//! 5. **Report** ([`report::Report`]): Append result blocks and insert the
//!    summary table
//!
//! All output locations of a run are owned by a [`session::Session`].
//!
//! # Example
//!
//! ```no_run
//! use statcourt_analysis::{
//!     dataset::Dataset, dispatch::Dispatcher, plot::BitmapRenderer, session::Session,
//!     spec::TestSpec,
//! };
//!
//! let dataset = Dataset::from_csv_path("sales.csv")?;
//! let session = Session::new("results");
//! let specs = [TestSpec::mean_difference("sales", "city")];
//! for spec in &specs {
//!     spec.validate(&dataset)?;
//! }
//!
//! let summary = Dispatcher::new(&session, BitmapRenderer::default()).run(&dataset, &specs)?;
//! println!("report written to {}", summary.report_path.display());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod adapter;
pub mod dataset;
pub mod dispatch;
pub mod plot;
pub mod report;
pub mod result;
pub mod session;
pub mod spec;
