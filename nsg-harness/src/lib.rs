pub mod bench;
pub mod bitmap;
pub mod error;
pub mod groundtruth;
pub mod index;
pub mod nsg;
pub mod params;
pub mod recall;
pub mod records;
pub mod results;
pub mod strategy;
pub mod test_util;
pub mod vecmath;
pub mod vectors;

pub use error::{HarnessError, Result};
