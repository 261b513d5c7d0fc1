use std::time::Duration;

/// Absolute gain difference above which two frames cannot be combined.
pub const GAIN_TOLERANCE: f64 = 0.1;

/// Sensor temperature deviation (°C) beyond which a compatibility warning is raised.
/// Temperature deviations never make a frame incompatible on their own.
pub const TEMPERATURE_TOLERANCE_C: f64 = 2.0;

/// Slack added to tolerance comparisons so a deviation of exactly the
/// tolerance stays inside it despite floating-point rounding.
pub const COMPARISON_EPSILON: f64 = 1e-9;

/// Remote quality score below which an uploaded file is rejected outright.
pub const QUALITY_ERROR_THRESHOLD: f64 = 60.0;

/// Remote quality score at or above which an uploaded file is accepted without a warning.
pub const QUALITY_CONFIDENT_THRESHOLD: f64 = 80.0;

/// Fixed cadence of job progress polling.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Delay between result fetches while the worker answers 202 (not materialized yet).
pub const DEFAULT_RESULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Default sigma threshold sent with outlier-detection requests.
pub const DEFAULT_OUTLIER_SIGMA: f64 = 3.0;

/// Default minimum consistency score for a frame to be recommended.
pub const DEFAULT_CONSISTENCY_THRESHOLD: f64 = 70.0;

/// Storage prefix under which every temporary upload lives.
pub const TEMP_UPLOAD_PREFIX: &str = "temp-uploads";

/// Token used in compatibility keys for metadata the frame does not carry.
pub const UNKNOWN_TOKEN: &str = "unknown";

/// Application directory name under the user config dir.
pub const APP_DIR_NAME: &str = "calibra";

/// Extensions accepted as FITS files.
pub const FITS_EXTENSIONS: [&str; 3] = ["fits", "fit", "fts"];

/// Extensions accepted as camera raw files. Contents are checked remotely.
pub const RAW_EXTENSIONS: [&str; 8] = ["cr2", "cr3", "nef", "arw", "dng", "raf", "orf", "rw2"];

/// Extensions accepted as TIFF files.
pub const TIFF_EXTENSIONS: [&str; 2] = ["tif", "tiff"];

/// Extension of PixInsight XISF files.
pub const XISF_EXTENSION: &str = "xisf";
