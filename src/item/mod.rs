/// This module provides the CSV item writers.
pub mod csv;
