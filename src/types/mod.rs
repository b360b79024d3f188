pub mod candle;
pub mod forecast;
pub mod levels;
pub mod report;
pub mod signals;

pub use candle::*;
pub use forecast::*;
pub use levels::*;
pub use report::*;
pub use signals::*;
