mod atomic;
mod fx;

pub use fx::SecpFx;
