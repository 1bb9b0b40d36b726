pub mod cache;
pub mod clients;
pub mod config;
pub mod errors;
pub mod espn;
pub mod fetch;
pub mod guide;
pub mod m3u;
pub mod pluto;
pub mod schedule;
pub mod transfer;
pub mod xmltv;
pub mod xtream;
