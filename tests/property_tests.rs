use proptest::prelude::*;
use std::path::{Path, PathBuf};
use tinypng_cli::download::derive_output_path;
use tinypng_cli::formats::suffix_from_mime;
use tinypng_cli::resolver::{matches_extension, Source};
use tinypng_cli::utils::calculate_compression_ratio;

proptest! {
    #[test]
    fn extension_match_ignores_case(stem in "[a-z0-9_]{1,12}", ext in "[a-z]{1,5}") {
        let upper = PathBuf::from(format!("{}.{}", stem, ext.to_uppercase()));
        let lower = PathBuf::from(format!("{}.{}", stem, ext));
        let filter = vec![ext.to_uppercase()];

        prop_assert!(matches_extension(&upper, &filter));
        prop_assert!(matches_extension(&lower, &filter));
    }

    #[test]
    fn extension_match_is_a_plain_suffix(name in "[a-z]{1,16}", ext in "[a-z]{1,4}") {
        let path = PathBuf::from(&name);
        let expected = name.ends_with(&ext);
        prop_assert_eq!(matches_extension(&path, &[ext]), expected);
    }

    #[test]
    fn empty_filter_entries_never_match(name in "[a-zA-Z0-9.]{1,16}") {
        prop_assert!(!matches_extension(Path::new(&name), &[String::new()]));
    }

    #[test]
    fn output_name_keeps_stem_and_directory(
        stem in "[a-zA-Z0-9_-]{1,16}",
        ext in "(png|jpg|webp)",
        mime in "image/(png|jpeg|webp|avif)"
    ) {
        let source = Source::File(PathBuf::from("photos").join(format!("{}.{}", stem, ext)));
        let output = derive_output_path(&source, &mime, None).unwrap();

        let suffix = suffix_from_mime(&mime).unwrap();
        prop_assert_eq!(output.parent(), Some(Path::new("photos")));
        prop_assert_eq!(
            output.file_name().unwrap().to_string_lossy().into_owned(),
            format!("{}-compressed.{}", stem, suffix)
        );
    }

    #[test]
    fn output_dir_overrides_source_location(stem in "[a-z]{1,12}") {
        let source = Source::File(PathBuf::from("in").join(format!("{}.png", stem)));
        let output = derive_output_path(&source, "image/png", Some(Path::new("out"))).unwrap();
        prop_assert_eq!(output, PathBuf::from("out").join(format!("{}-compressed.png", stem)));
    }

    #[test]
    fn compression_ratio_in_range(original in 1u64..10_000_000, compressed in 0u64..10_000_000) {
        prop_assume!(compressed <= original);
        let ratio = calculate_compression_ratio(original, compressed);
        prop_assert!((0.0..=100.0).contains(&ratio));
    }
}
