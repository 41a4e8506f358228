//! Integration tests for payflow-api
//!
//! Uses wiremock to simulate the PayFlow backend and verifies the
//! ApiClient's requests, response decoding and error mapping.

mod common;

mod test_debts;
mod test_errors;
