//! Language front ends that turn source files into code units.

pub mod javascript;
