//! Integration tests for the VidHub extension host.

mod constants_test;
mod helpers;
mod hooks_test;
mod http_test;
mod install_test;
mod lifecycle_test;
