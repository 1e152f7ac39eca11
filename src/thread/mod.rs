pub mod controller;
pub mod index;
pub mod model;
pub mod populate;
pub mod service;
