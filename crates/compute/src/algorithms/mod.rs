//! Numerical building blocks for distribution features and the anomaly model.
//!
//! - [`moments`]: per-axis mean and population standard deviation
//! - [`gaussian`]: single-component Gaussian fit
//! - [`lof`]: Local Outlier Factor over a point cloud
//! - [`pca`]: two-axis principal component analysis
//! - [`isolation_forest`]: seeded isolation forest ensemble

pub mod gaussian;
pub mod isolation_forest;
pub mod lof;
pub mod moments;
pub mod pca;
