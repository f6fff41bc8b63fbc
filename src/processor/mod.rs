pub mod archive;
pub mod size_gate;
