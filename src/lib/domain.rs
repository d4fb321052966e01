//! Domain types, capabilities and services

pub mod communication;
