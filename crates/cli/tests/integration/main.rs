mod common;
mod generate_tests;
mod inspect_tests;
