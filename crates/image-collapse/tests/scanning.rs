use image_collapse::{
    ImagePayload, Span, build_decorations, count_occurrences, scan,
};

fn valid_data(len: usize) -> String {
    "iVBORw0KGgoAAAANSUhEUg"
        .chars()
        .cycle()
        .take(len)
        .collect()
}

#[test]
fn text_without_references_yields_empty_set() {
    for text in [
        "",
        "plain prose with no images at all",
        "a normal link ![alt](https://example.com/pic.png) is not embedded",
        "data:image/png;base64,AAAA outside reference syntax",
    ] {
        assert!(build_decorations(text).is_empty());
        assert_eq!(count_occurrences(text), 0);
    }
}

#[test]
fn single_reference_produces_one_region_spanning_the_match() {
    // End-to-end scenario: "A ![cat](data:image/png;base64,<150 chars>) B".
    let reference = format!("![cat](data:image/png;base64,{})", valid_data(150));
    let text = format!("A {reference} B");

    let set = build_decorations(&text);
    assert_eq!(set.len(), 1);

    let region = set.get(0).unwrap();
    assert_eq!(region.span, Span::new(2, 2 + reference.chars().count()));
    assert_eq!(region.alt_text, "cat");

    let matched: String = text
        .chars()
        .skip(region.span.start)
        .take(region.span.len())
        .collect();
    assert_eq!(matched, reference);
}

#[test]
fn n_references_produce_n_ordered_regions() {
    let mut text = String::new();
    let mut expected = Vec::new();
    for i in 0..5 {
        let alt = format!("img-{i}");
        text.push_str(&format!(
            "paragraph {i} ![{alt}](data:image/png;base64,{})\n",
            valid_data(110 + i)
        ));
        expected.push(alt);
    }

    let set = build_decorations(&text);
    assert_eq!(set.len(), 5);

    let alts: Vec<&str> = set.iter().map(|r| r.alt_text.as_str()).collect();
    assert_eq!(alts, expected);

    for pair in set.regions().windows(2) {
        assert!(pair[0].span.end <= pair[1].span.start, "regions overlap");
    }
}

#[test]
fn short_payload_in_valid_syntax_is_not_decorated() {
    // End-to-end scenario: 40 chars of data in otherwise-valid syntax.
    let text = format!(
        "before ![small](data:image/png;base64,{}) after",
        valid_data(40)
    );
    assert!(build_decorations(&text).is_empty());
}

#[test]
fn minimum_length_boundary_is_exact() {
    let at_99 = format!("![a](data:image/png;base64,{})", valid_data(99));
    let at_100 = format!("![a](data:image/png;base64,{})", valid_data(100));

    assert_eq!(count_occurrences(&at_99), 0);
    assert_eq!(count_occurrences(&at_100), 1);
}

#[test]
fn rebuilding_from_identical_snapshot_is_identical() {
    let text = format!(
        "x ![a](data:image/png;base64,{}) y ![b](data:image/jpeg;base64,{}) z",
        valid_data(120),
        valid_data(130)
    );
    assert_eq!(build_decorations(&text), build_decorations(&text));
}

#[test]
fn scanned_payloads_parse_back_through_the_grammar() {
    let text = format!("![pic](data:image/webp;base64,{})", valid_data(120));
    let occurrence = scan(&text).next().unwrap();

    let reparsed = ImagePayload::parse(occurrence.payload.reference()).unwrap();
    assert_eq!(reparsed, occurrence.payload);
    assert_eq!(reparsed.subtype(), "webp");
}

#[test]
fn mixed_document_with_unicode_prose() {
    let text = format!(
        "日本語の文章 ![絵](data:image/png;base64,{}) そして続き。",
        valid_data(104)
    );
    let set = build_decorations(&text);
    assert_eq!(set.len(), 1);

    let region = set.get(0).unwrap();
    let matched: String = text
        .chars()
        .skip(region.span.start)
        .take(region.span.len())
        .collect();
    assert!(matched.starts_with("![絵]("));
    assert!(matched.ends_with(')'));
}
