pub mod cancel;
pub mod http;
pub mod logging;
pub mod timing;
