//! Built-in vocabularies.

use super::{ConstantKey, ConstantTable};

fn id_table(entries: &[(u32, &str)]) -> ConstantTable {
    entries
        .iter()
        .map(|(id, label)| (ConstantKey::Id(*id), label.to_string()))
        .collect()
}

/// Built-in video categories.
pub fn default_categories() -> ConstantTable {
    id_table(&[
        (1, "Music"),
        (2, "Films"),
        (3, "Vehicles"),
        (4, "Art"),
        (5, "Sports"),
        (6, "Travels"),
        (7, "Gaming"),
        (8, "People"),
        (9, "Comedy"),
        (10, "Entertainment"),
        (11, "News & Politics"),
        (12, "How To"),
        (13, "Education"),
        (14, "Activism"),
        (15, "Science & Technology"),
        (16, "Animals"),
        (17, "Kids"),
        (18, "Food"),
    ])
}

/// Built-in video licences.
pub fn default_licences() -> ConstantTable {
    id_table(&[
        (1, "Attribution"),
        (2, "Attribution - Share Alike"),
        (3, "Attribution - No Derivatives"),
        (4, "Attribution - Non Commercial"),
        (5, "Attribution - Non Commercial - Share Alike"),
        (6, "Attribution - Non Commercial - No Derivatives"),
        (7, "Public Domain Dedication"),
    ])
}

/// Built-in video privacies.
pub fn default_privacies() -> ConstantTable {
    id_table(&[
        (1, "Public"),
        (2, "Unlisted"),
        (3, "Private"),
        (4, "Internal"),
        (5, "Password protected"),
    ])
}

/// Built-in playlist privacies.
pub fn default_playlist_privacies() -> ConstantTable {
    id_table(&[(1, "Public"), (2, "Unlisted"), (3, "Private")])
}

/// Built-in video languages, keyed by ISO 639 code.
pub fn default_languages() -> ConstantTable {
    [
        ("ar", "Arabic"),
        ("ca", "Catalan"),
        ("cs", "Czech"),
        ("de", "German"),
        ("el", "Greek"),
        ("en", "English"),
        ("eo", "Esperanto"),
        ("es", "Spanish"),
        ("eu", "Basque"),
        ("fa", "Persian"),
        ("fi", "Finnish"),
        ("fr", "French"),
        ("gl", "Galician"),
        ("hu", "Hungarian"),
        ("it", "Italian"),
        ("ja", "Japanese"),
        ("ko", "Korean"),
        ("nl", "Dutch"),
        ("no", "Norwegian"),
        ("oc", "Occitan"),
        ("pl", "Polish"),
        ("pt", "Portuguese"),
        ("ru", "Russian"),
        ("sv", "Swedish"),
        ("th", "Thai"),
        ("tr", "Turkish"),
        ("uk", "Ukrainian"),
        ("vi", "Vietnamese"),
        ("zh", "Chinese"),
        ("zxx", "No linguistic content"),
    ]
    .into_iter()
    .map(|(code, label)| (ConstantKey::from(code), label.to_string()))
    .collect()
}
