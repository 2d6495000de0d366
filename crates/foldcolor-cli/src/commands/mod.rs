pub mod check;
pub mod colormaps;
pub mod run;
