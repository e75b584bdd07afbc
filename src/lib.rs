//! Air-quality exploration: load station measurements, filter by station and
//! date, smooth, summarise, and flag threshold breaches.

pub mod data;
