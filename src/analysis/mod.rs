//! Exploratory analysis of building energy datasets

pub mod dataset;
pub mod plot;
pub mod stats;

pub use dataset::{Column, Frame};
pub use plot::{
    correlation_heatmap, correlation_matrix, count_plot, density_plot, distribution_plot,
    trend_plot,
};
