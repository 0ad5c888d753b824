#![forbid(unsafe_code)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]
#![warn(missing_docs, unreachable_pub, unused_must_use)]
//! Browser entry point for the Loqui front-end.
//!
//! On wasm32 this mounts `loqui_ui::run_app`. Native builds only print how to
//! produce the browser bundle, so `cargo test --workspace` still links the binary.

#[cfg(target_arch = "wasm32")]
fn main() {
    loqui_ui::run_app();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::io::Result<()> {
    use std::io::Write;

    writeln!(
        std::io::stderr().lock(),
        "loqui-ui runs in the browser; serve it with `trunk serve` from crates/loqui-ui."
    )
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    #[test]
    fn native_stub_exits_cleanly() {
        assert!(super::main().is_ok());
    }
}
