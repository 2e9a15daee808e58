use deckwise::{
    CardDatabase, CardId, CardLookup, CardQuery, ColorSet, CommanderSource, DeckImport,
    DeckListError, DeckStats, Dialect, FileStore, Library, Role, assemble_deck, parse_deck_list,
};

fn card_db() -> CardDatabase {
    CardDatabase::load(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/cards.json"))
        .expect("fixture card database should load")
}

fn import(db: &CardDatabase, name: &str, text: &str) -> DeckImport {
    let parsed = parse_deck_list(text).expect("deck list should parse");
    let queries: Vec<CardQuery> = parsed.entries().map(CardQuery::for_entry).collect();
    assemble_deck(name, parsed, &db.lookup_batch(&queries))
}

#[test]
fn merges_printings_of_one_card() {
    let parsed = parse_deck_list("2 Sol Ring (C21) 263\n2 Sol Ring (LTC) 301").unwrap();
    let entries: Vec<_> = parsed.entries().collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "Sol Ring");
    assert_eq!(entries[0].quantity, 4);
}

#[test]
fn partner_commanders_and_import_report() {
    let db = card_db();
    let report = import(
        &db,
        "Thrasios Tymna",
        "1 Thrasios, Triton Hero\n\
         1 Tymna the Weaver\n\
         1x Sol Ring (C21) 263 *F*\n\
         Counterspell (CMR) 395 1\n\
         1 Lightning Bolt\n\
         1 Nonexistent Card\n\
         this line is junk\n",
    );

    let commanders: Vec<&str> = report
        .deck
        .commander
        .iter()
        .map(|e| e.name.as_str())
        .collect();
    assert_eq!(commanders, vec!["Thrasios, Triton Hero", "Tymna the Weaver"]);
    assert_eq!(report.deck.color_identity(), ColorSet::parse("WUBG"));
    assert_eq!(report.not_found, vec!["Nonexistent Card"]);
    assert_eq!(report.off_identity, vec!["Lightning Bolt"]);
    assert_eq!(report.parse_errors.len(), 1);
    assert_eq!(report.parse_errors[0].line, 7);

    let ring = report
        .deck
        .cards
        .iter()
        .find(|e| e.name == "Sol Ring")
        .unwrap();
    assert_eq!(ring.card_id(), Some(&CardId::new("sol-ring-c21-263")));
    assert_eq!(report.deck.legal_cards().len(), 2);
}

#[test]
fn resolves_face_names_and_prefers_english() {
    let db = card_db();
    let report = import(&db, "Faces", "// Commander\n1 Atraxa, Praetors' Voice\n// Deck\n1 Insectile Aberration\n1 Sol Ring");

    let names: Vec<&str> = report.deck.cards.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Delver of Secrets // Insectile Aberration", "Sol Ring"]
    );
    assert_eq!(
        report.deck.cards[1].card_id(),
        Some(&CardId::new("sol-ring-c21-263"))
    );
    assert!(report.not_found.is_empty());
}

#[test]
fn tabular_exports_have_no_commander() {
    let parsed = parse_deck_list(
        "Quantity;Name;Set Code\n3;Island;UNF\n;Sol Ring;C21\n2;;\nx;Counterspell;CMR\n",
    )
    .unwrap();
    assert_eq!(parsed.dialect, Dialect::Tabular { delimiter: b';' });
    assert_eq!(parsed.commander_source, CommanderSource::None);
    assert!(parsed.commander.is_empty());

    let cards: Vec<(&str, u32)> = parsed
        .cards
        .iter()
        .map(|e| (e.name.as_str(), e.quantity))
        .collect();
    assert_eq!(cards, vec![("Island", 3), ("Sol Ring", 1)]);
    assert_eq!(parsed.errors.len(), 1);
}

#[test]
fn structural_failures_are_errors() {
    assert!(matches!(
        parse_deck_list("Quantity,Binder Name,Set\n1,Trade,C21"),
        Err(DeckListError::MissingNameColumn { .. })
    ));
    match parse_deck_list("just some words\nmore words") {
        Err(DeckListError::NoEntries { errors }) => assert_eq!(errors.len(), 2),
        other => panic!("expected NoEntries, got {other:?}"),
    }
}

#[test]
fn imported_deck_survives_file_store() {
    let db = card_db();
    let report = import(
        &db,
        "Stored",
        "// Commander\n1 Atraxa, Praetors' Voice\n// Deck\n1 Sol Ring\n1 Counterspell\n1 Grave Titan\n5 Island",
    );

    let dir = tempfile::tempdir().unwrap();
    Library::new(FileStore::open(dir.path()).unwrap())
        .save_deck(&report.deck)
        .unwrap();

    let reopened = Library::new(FileStore::open(dir.path()).unwrap());
    let deck = reopened.deck(&report.deck.id).unwrap().unwrap();
    assert_eq!(deck, report.deck);

    let stats = DeckStats::from_deck(&deck);
    assert_eq!(stats.total_cards, 9);
    assert_eq!(stats.lands, 5);
    assert_eq!(stats.creatures, 2);
    assert_eq!(stats.role_count(Role::Counterspells), 1);
    assert_eq!(stats.role_count(Role::Ramp), 1);
}
