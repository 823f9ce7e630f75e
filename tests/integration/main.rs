//! Integration tests for the waymark catalog browser

mod browse_flows;
mod persistence;
mod support;
