//! Integration tests for Trellis context resolution

mod cli_binary;
mod config_integration;
mod resolver_tree;
mod test_utils;
