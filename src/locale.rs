//! Panel and toast strings, keyed by the document language.

/// The strings rendered into the injected panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strings {
    pub accept_all: &'static str,
    pub ignore_all: &'static str,
    pub done: &'static str,
}

static EN: Strings = Strings {
    accept_all: "Accept all",
    ignore_all: "Ignore all",
    done: "Done",
};

static AR: Strings = Strings {
    accept_all: "قبول الكل",
    ignore_all: "تجاهل الكل",
    done: "تمت المعالجة",
};

/// Pick the string table for a document `lang` attribute. Arabic tags get
/// the Arabic table; everything else falls back to English.
pub fn for_lang(tag: &str) -> &'static Strings {
    if tag.trim().to_ascii_lowercase().starts_with("ar") {
        &AR
    } else {
        &EN
    }
}
