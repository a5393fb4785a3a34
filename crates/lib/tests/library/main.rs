mod common;
mod pipeline_tests;
mod propagation_tests;
