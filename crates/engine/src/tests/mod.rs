mod helpers;
mod loader_tests;
