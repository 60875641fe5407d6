pub mod error;
pub(crate) mod http;
pub mod images;
pub mod openweather;
pub mod storage;
