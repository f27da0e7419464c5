mod capability;
mod radio;
pub use capability::BluezCapabilities;
pub use radio::BluezRadio;
