use std::collections::HashMap;

/// Maps a recording's file name to the label shown in reports.
pub trait LabelResolver: Sync {
    fn label(&self, file_name: &str) -> String;
}

/// Drops the last four characters (a `.wav`-style extension).
#[derive(Clone, Copy, Debug, Default)]
pub struct StripExtension;

impl LabelResolver for StripExtension {
    fn label(&self, file_name: &str) -> String {
        let count = file_name.chars().count();
        file_name.chars().take(count.saturating_sub(4)).collect()
    }
}

/// Explicit file name to label table, falling back to [`StripExtension`].
#[derive(Clone, Debug, Default)]
pub struct LabelOverrides {
    overrides: HashMap<String, String>,
}

impl LabelOverrides {
    #[allow(dead_code)]
    pub fn new(overrides: HashMap<String, String>) -> Self {
        Self { overrides }
    }

    pub fn insert(&mut self, file_name: impl Into<String>, label: impl Into<String>) {
        self.overrides.insert(file_name.into(), label.into());
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

impl LabelResolver for LabelOverrides {
    fn label(&self, file_name: &str) -> String {
        match self.overrides.get(file_name) {
            Some(label) => label.clone(),
            None => StripExtension.label(file_name),
        }
    }
}

impl<F> LabelResolver for F
where
    F: Fn(&str) -> String + Sync,
{
    fn label(&self, file_name: &str) -> String {
        self(file_name)
    }
}

/// Parse `FILE=LABEL` pairs; entries without `=` are ignored.
pub fn parse_label_args(args: &[String]) -> HashMap<String, String> {
    args.iter()
        .filter_map(|s| {
            let mut parts = s.splitn(2, '=');
            let key = parts.next()?.trim().to_string();
            let val = parts.next()?.trim().to_string();
            Some((key, val))
        })
        .collect()
}
