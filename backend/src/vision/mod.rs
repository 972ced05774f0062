pub mod classifier;
pub mod crop_detector;
pub mod disease;
pub mod preprocess;
