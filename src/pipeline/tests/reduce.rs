use crate::pipeline::{self, Options};
use crate::playlist;
use crate::policy::FilterRules;

fn options() -> Options {
    Options {
        keep_count: 1,
        keep_unclassified: false,
        max_output_bytes: 20 * 1024 * 1024,
        rules: FilterRules::default(),
    }
}

#[test]
fn keeps_the_best_entry_per_channel() {
    let input = "#EXTM3U\n#EXTINF:-1,News 720p\nhttp://a/1\n#EXTINF:-1,News 1080p\nhttp://a/2\n";

    let reduction = pipeline::reduce(input, &options()).unwrap();

    assert_eq!(
        reduction.output,
        "#EXTM3U\n#EXTINF:-1,News 1080p\nhttp://a/2\n"
    );
    assert_eq!(reduction.summary.parsed, 2);
    assert_eq!(reduction.summary.groups, 1);
    assert_eq!(reduction.summary.emitted, 1);
    assert_eq!(reduction.summary.tiers.fhd, 1);
}

#[test]
fn top_n_mode_keeps_the_three_best() {
    let input = "#EXTM3U\n\
        #EXTINF:-1,Chan SD\nhttp://a/sd\n\
        #EXTINF:-1,Chan 720p\nhttp://a/hd\n\
        #EXTINF:-1,Chan 4K\nhttp://a/uhd\n\
        #EXTINF:-1,Chan 1080p\nhttp://a/fhd\n";
    let opts = Options {
        keep_count: 3,
        ..options()
    };

    let reduction = pipeline::reduce(input, &opts).unwrap();

    assert_eq!(
        reduction.output,
        "#EXTM3U\n\
         #EXTINF:-1,Chan 4K\nhttp://a/uhd\n\
         #EXTINF:-1,Chan 1080p\nhttp://a/fhd\n\
         #EXTINF:-1,Chan 720p\nhttp://a/hd\n"
    );
    assert_eq!(reduction.summary.kept_after_dedup, 3);
}

#[test]
fn quality_tie_falls_back_to_input_order() {
    let input = "#EXTM3U\n#EXTINF:-1,Alpha 720p\nhttp://a/1\n#EXTINF:-1,Beta 720p\nhttp://a/2\n";

    let reduction = pipeline::reduce(input, &options()).unwrap();

    assert_eq!(
        reduction.output,
        "#EXTM3U\n#EXTINF:-1,Alpha 720p\nhttp://a/1\n#EXTINF:-1,Beta 720p\nhttp://a/2\n"
    );
}

#[test]
fn budget_admits_exactly_the_higher_ranked_entry() {
    let first_meta = "#EXTINF:-1,News 1080p";
    let first_addr = "http://a/1";
    let second_meta = "#EXTINF:-1,Film 720p";
    let second_addr = "http://a/2";
    let input = format!("#EXTM3U\n{second_meta}\n{second_addr}\n{first_meta}\n{first_addr}\n");

    let first_len = first_meta.len() + first_addr.len() + 2;
    let second_len = second_meta.len() + second_addr.len() + 2;
    let budget = playlist::header_len() + first_len;
    let opts = Options {
        max_output_bytes: budget,
        ..options()
    };

    let reduction = pipeline::reduce(&input, &opts).unwrap();

    assert_eq!(reduction.output, format!("#EXTM3U\n{first_meta}\n{first_addr}\n"));
    assert_eq!(reduction.summary.emitted, 1);
    assert_eq!(reduction.summary.cut_by_budget, 1);
    // The cutoff is tight: the output fits, the next entry would not.
    assert!(reduction.summary.output_bytes <= budget);
    assert!(reduction.summary.output_bytes + second_len > budget);
}

#[test]
fn budget_cutoff_is_a_contiguous_prefix() {
    let input = "#EXTM3U\n\
        #EXTINF:-1,Alpha 4K\nhttp://a/alpha\n\
        #EXTINF:-1,Beta 1080p\nhttp://a/beta-with-a-very-long-stream-address-path\n\
        #EXTINF:-1,Gamma 720p\nhttp://a/g\n";

    let alpha_len = "#EXTINF:-1,Alpha 4K".len() + "http://a/alpha".len() + 2;
    let gamma_len = "#EXTINF:-1,Gamma 720p".len() + "http://a/g".len() + 2;
    // Room for alpha and gamma, but not for beta.
    let budget = playlist::header_len() + alpha_len + gamma_len + 4;
    let opts = Options {
        max_output_bytes: budget,
        ..options()
    };

    let reduction = pipeline::reduce(input, &opts).unwrap();

    // Beta overflows first and halts admission; gamma is not reconsidered
    // even though it would fit.
    assert_eq!(
        reduction.output,
        "#EXTM3U\n#EXTINF:-1,Alpha 4K\nhttp://a/alpha\n"
    );
    assert_eq!(reduction.summary.cut_by_budget, 2);
}

#[test]
fn unclassified_entries_are_dropped_or_ranked_last() {
    let input = "#EXTM3U\n#EXTINF:-1,News\nhttp://a/plain\n#EXTINF:-1,News 720p\nhttp://a/hd\n";

    let strict = pipeline::reduce(input, &options()).unwrap();
    assert_eq!(strict.summary.unclassified_dropped, 1);
    assert_eq!(strict.summary.emitted, 1);

    let lenient = Options {
        keep_unclassified: true,
        keep_count: 2,
        ..options()
    };
    let reduction = pipeline::reduce(input, &lenient).unwrap();
    assert_eq!(
        reduction.output,
        "#EXTM3U\n#EXTINF:-1,News 720p\nhttp://a/hd\n#EXTINF:-1,News\nhttp://a/plain\n"
    );
    assert_eq!(reduction.summary.tiers.unknown, 1);
}

#[test]
fn whitelist_overrides_category_exclusion() {
    let rules = FilterRules {
        category_patterns: vec![r"(?i)series".into()],
        category_whitelist: vec!["GLOBO".into()],
        ..FilterRules::default()
    };
    let input = "#EXTM3U\n\
        #EXTINF:-1 group-title=\"SERIES\",Show 720p\nhttp://a/1\n\
        #EXTINF:-1 group-title=\"SERIES - GLOBO\",Novela 720p\nhttp://a/2\n";
    let opts = Options {
        rules,
        ..options()
    };

    let reduction = pipeline::reduce(input, &opts).unwrap();

    assert_eq!(reduction.summary.rejected_category, 1);
    assert_eq!(reduction.summary.emitted, 1);
    assert!(reduction.output.contains("Novela 720p"));
}

#[test]
fn summary_counts_every_drop_decision() {
    let input = "#EXTM3U\n\
        #EXTINF:-1 group-title=\"SERIES\",Show S01E01\nhttp://h/1\n\
        #EXTINF:-1,Old Film (1999) 720p\nhttp://h/2\n\
        #EXTINF:-1,Some Movie HD\nhttp://h/movie/3\n\
        #EXTINF:-1,Plain\nhttp://h/4\n\
        #EXTINF:-1,Good 1080p\nhttp://h/5\n\
        #EXTINF:-1,Orphan 720p\n";
    let opts = Options {
        rules: FilterRules::builtin(),
        ..options()
    };

    let summary = pipeline::reduce(input, &opts).unwrap().summary;

    assert_eq!(summary.parsed, 5);
    assert_eq!(summary.malformed, 1);
    assert_eq!(summary.rejected_category, 1);
    assert_eq!(summary.rejected_name, 1);
    assert_eq!(summary.rejected_address, 1);
    assert_eq!(summary.unclassified_dropped, 1);
    assert_eq!(summary.emitted, 1);
    assert_eq!(summary.tiers.fhd, 1);
}

#[test]
fn rerunning_on_the_output_changes_nothing() {
    let input = "#EXTM3U\n\
        #EXTINF:-1,News 720p\nhttp://a/1\n\
        #EXTINF:-1,News 1080p\nhttp://a/2\n\
        #EXTINF:-1,Sports HD\nhttp://a/3\n\
        #EXTINF:-1,Docs 4K\nhttp://a/4\n";
    let opts = options();

    let first = pipeline::reduce(input, &opts).unwrap();
    let second = pipeline::reduce(&first.output, &opts).unwrap();

    assert_eq!(second.output, first.output);
}

#[test]
fn identical_runs_produce_identical_output() {
    let input = "#EXTM3U\n\
        #EXTINF:-1,Alpha 720p\nhttp://a/1\n\
        #EXTINF:-1,Beta 720p\nhttp://a/2\n\
        #EXTINF:-1,Gamma 720p\nhttp://a/3\n\
        #EXTINF:-1,Delta 1080p\nhttp://a/4\n";
    let opts = options();

    let first = pipeline::reduce(input, &opts).unwrap();
    let second = pipeline::reduce(input, &opts).unwrap();

    assert_eq!(first.output, second.output);
    assert_eq!(first.summary, second.summary);
}

#[test]
fn empty_input_yields_a_valid_empty_document() {
    let reduction = pipeline::reduce("#EXTM3U\n", &options()).unwrap();

    assert_eq!(reduction.output, "#EXTM3U\n");
    assert_eq!(reduction.summary.parsed, 0);
    assert_eq!(reduction.summary.emitted, 0);
}

#[test]
fn invalid_configuration_fails_before_processing() {
    assert!(
        pipeline::reduce(
            "#EXTM3U\n",
            &Options {
                keep_count: 0,
                ..options()
            }
        )
        .is_err()
    );

    assert!(
        pipeline::reduce(
            "#EXTM3U\n",
            &Options {
                max_output_bytes: 4,
                ..options()
            }
        )
        .is_err()
    );

    let bad_rules = Options {
        rules: FilterRules {
            category_patterns: vec!["(".into()],
            ..FilterRules::default()
        },
        ..options()
    };
    assert!(pipeline::reduce("#EXTM3U\n", &bad_rules).is_err());
}
