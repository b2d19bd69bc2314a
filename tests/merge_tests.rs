use rapport::merge::merge;
use rapport::record::{
    EntryFragment, IdentityFragment, InstagramFragment, LinkedinFragment, MemoryFragment, Record,
    SocialFragment, SocialItemFragment, TreeFragment,
};

fn fresh() -> Record {
    Record::new("k", 1_000)
}

fn leaves_fragment(answer: &str) -> MemoryFragment {
    MemoryFragment {
        psycho_tree: Some(TreeFragment {
            leaves: vec![EntryFragment::answer(answer)],
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn instagram_posts(texts: &[&str]) -> MemoryFragment {
    MemoryFragment {
        social: Some(SocialFragment {
            instagram: Some(InstagramFragment {
                posts: texts.iter().map(|t| SocialItemFragment::text(*t)).collect(),
                ..Default::default()
            }),
            linkedin: None,
        }),
        ..Default::default()
    }
}

// --- Idempotence ---

#[test]
fn remerging_identical_fragment_changes_nothing() {
    let frag = MemoryFragment {
        identity: Some(IdentityFragment {
            name: Some("Ada".into()),
            email: Some("ada@example.com".into()),
        }),
        social: Some(SocialFragment {
            instagram: Some(InstagramFragment {
                handle: Some("@ada".into()),
                posts: vec![SocialItemFragment::text("Sunset pic")],
                ..Default::default()
            }),
            linkedin: Some(LinkedinFragment {
                url: Some("https://linkedin.com/in/ada".into()),
                activities: vec![SocialItemFragment::text("Shared an article")],
            }),
        }),
        psycho_tree: Some(TreeFragment {
            leaves: vec![EntryFragment::answer("I love hiking").question("hobbies?")],
            roots: vec![EntryFragment::answer("I fear being forgotten")],
            ..Default::default()
        }),
        has_deep_answer: Some(true),
    };

    let once = merge(&fresh(), &frag, 2_000);
    let twice = merge(&once, &frag, 3_000);
    assert_eq!(once, twice);
}

// --- Social dedup ---

#[test]
fn posts_dedup_case_insensitive_within_one_fragment() {
    let merged = merge(&fresh(), &instagram_posts(&["Hello", "hello"]), 0);
    assert_eq!(merged.social.instagram.posts.len(), 1);
    assert_eq!(merged.social.instagram.posts[0].text, "Hello");
}

#[test]
fn posts_dedup_across_merges() {
    let r1 = merge(&fresh(), &instagram_posts(&["Sunset pic"]), 0);
    let r2 = merge(&r1, &instagram_posts(&["sunset pic"]), 0);
    assert_eq!(r2.social.instagram.posts.len(), 1);
}

#[test]
fn dedup_scans_whole_list_not_just_recent() {
    let r1 = merge(&fresh(), &instagram_posts(&["first", "second", "third"]), 0);
    let r2 = merge(&r1, &instagram_posts(&["FIRST"]), 0);
    assert_eq!(r2.social.instagram.posts.len(), 3);
}

#[test]
fn empty_post_text_skipped_without_failing_rest() {
    let merged = merge(&fresh(), &instagram_posts(&["", "  ", "kept"]), 0);
    assert_eq!(merged.social.instagram.posts.len(), 1);
    assert_eq!(merged.social.instagram.posts[0].text, "kept");
}

#[test]
fn posts_get_fresh_unique_ids() {
    let merged = merge(&fresh(), &instagram_posts(&["a", "b"]), 0);
    let ids: Vec<_> = merged.social.instagram.posts.iter().map(|p| &p.id).collect();
    assert_ne!(ids[0], ids[1]);
}

#[test]
fn linkedin_activities_dedup_independently_of_instagram() {
    let frag = MemoryFragment {
        social: Some(SocialFragment {
            instagram: Some(InstagramFragment {
                posts: vec![SocialItemFragment::text("same text")],
                ..Default::default()
            }),
            linkedin: Some(LinkedinFragment {
                url: None,
                activities: vec![SocialItemFragment::text("same text")],
            }),
        }),
        ..Default::default()
    };
    let merged = merge(&fresh(), &frag, 0);
    assert_eq!(merged.social.instagram.posts.len(), 1);
    assert_eq!(merged.social.linkedin.activities.len(), 1);
}

// --- Profile tree ---

#[test]
fn leaves_only_fragment_leaves_other_layers_untouched() {
    let merged = merge(&fresh(), &leaves_fragment("I love hiking"), 0);
    assert_eq!(merged.profile_tree.leaves.len(), 1);
    assert!(merged.profile_tree.branches.is_empty());
    assert!(merged.profile_tree.trunk.is_empty());
    assert!(merged.profile_tree.roots.is_empty());
}

#[test]
fn entry_dedup_is_on_question_answer_pair() {
    let frag = MemoryFragment {
        psycho_tree: Some(TreeFragment {
            leaves: vec![
                EntryFragment::answer("hiking").question("hobby?"),
                EntryFragment::answer("HIKING").question("Hobby?"),
                EntryFragment::answer("hiking").question("weekend plans?"),
            ],
            ..Default::default()
        }),
        ..Default::default()
    };
    let merged = merge(&fresh(), &frag, 0);
    // same (question, answer) pair collapses; same answer under a different
    // question does not
    assert_eq!(merged.profile_tree.leaves.len(), 2);
}

#[test]
fn same_answer_in_different_layers_is_kept_in_both() {
    let frag = MemoryFragment {
        psycho_tree: Some(TreeFragment {
            leaves: vec![EntryFragment::answer("family matters")],
            roots: vec![EntryFragment::answer("family matters")],
            ..Default::default()
        }),
        ..Default::default()
    };
    let merged = merge(&fresh(), &frag, 0);
    assert_eq!(merged.profile_tree.leaves.len(), 1);
    assert_eq!(merged.profile_tree.roots.len(), 1);
}

#[test]
fn entry_without_answer_is_skipped() {
    let frag = MemoryFragment {
        psycho_tree: Some(TreeFragment {
            leaves: vec![
                EntryFragment::default(),
                EntryFragment::answer("   "),
                EntryFragment::answer("real answer"),
            ],
            ..Default::default()
        }),
        ..Default::default()
    };
    let merged = merge(&fresh(), &frag, 0);
    assert_eq!(merged.profile_tree.leaves.len(), 1);
}

#[test]
fn tags_coerced_to_explicit_deduplicated_list() {
    let frag = MemoryFragment {
        psycho_tree: Some(TreeFragment {
            leaves: vec![
                EntryFragment::answer("no tags supplied"),
                EntryFragment::answer("tagged").tags(vec![
                    "hobby".into(),
                    "Hobby".into(),
                    "  ".into(),
                    "outdoors".into(),
                ]),
            ],
            ..Default::default()
        }),
        ..Default::default()
    };
    let merged = merge(&fresh(), &frag, 0);
    assert!(merged.profile_tree.leaves[0].tags.is_empty());
    assert_eq!(merged.profile_tree.leaves[1].tags, vec!["hobby", "outdoors"]);
}

#[test]
fn entries_carry_layer_tag_and_merge_timestamp() {
    let merged = merge(&fresh(), &leaves_fragment("hiking"), 42);
    let entry = &merged.profile_tree.leaves[0];
    assert_eq!(entry.layer, rapport::record::Layer::Leaves);
    assert_eq!(entry.created_at, 42);
}

// --- Identity ---

#[test]
fn identity_fills_but_never_erases() {
    let r1 = merge(
        &fresh(),
        &MemoryFragment {
            identity: Some(IdentityFragment {
                name: Some("Ada".into()),
                email: None,
            }),
            ..Default::default()
        },
        0,
    );
    assert_eq!(r1.identity.name.as_deref(), Some("Ada"));

    // empty string counts as absent
    let r2 = merge(
        &r1,
        &MemoryFragment {
            identity: Some(IdentityFragment {
                name: Some("".into()),
                email: Some("ada@example.com".into()),
            }),
            ..Default::default()
        },
        0,
    );
    assert_eq!(r2.identity.name.as_deref(), Some("Ada"));
    assert_eq!(r2.identity.email.as_deref(), Some("ada@example.com"));
}

#[test]
fn identity_id_is_immutable_through_merges() {
    let merged = merge(&fresh(), &leaves_fragment("x"), 0);
    assert_eq!(merged.identity.id, "k");
}

// --- Merge scope ---

#[test]
fn merge_does_not_touch_transcript_or_timestamps() {
    let mut rec = fresh();
    rec.transcript.push(rapport::record::Turn {
        role: rapport::record::Role::User,
        content: "hi".into(),
        created_at: 5,
    });
    let merged = merge(&rec, &leaves_fragment("x"), 999);
    assert_eq!(merged.transcript, rec.transcript);
    assert_eq!(merged.created_at, rec.created_at);
    assert_eq!(merged.updated_at, rec.updated_at);
}

#[test]
fn empty_fragment_is_a_noop() {
    let rec = merge(&fresh(), &leaves_fragment("x"), 0);
    let merged = merge(&rec, &MemoryFragment::default(), 0);
    assert_eq!(rec, merged);
}
