//! Deployable bundles

pub mod packager;

pub use packager::{Bundle, BundleOptions, BUNDLE_PREFIX, BUNDLE_SUFFIX, MANIFEST_FILE};
