//! Barre d'adresse : état d'édition du texte saisi.
//!
//! Purement logique : texte, curseur, focus. La soumission rend le texte
//! brut ; la normalisation (préfixe `https://`) est faite par
//! [`crate::shell::normalize_url`] pour que la barre et le bouton « Go »
//! suivent exactement le même chemin.

use url::Url;

/// Badge dessiné devant une URL dont le domaine est en punycode (`xn--`),
/// pour qu'un domaine homographe ne puisse pas se faire passer pour un autre.
pub const PUNYCODE_BADGE: &str = "punycode";

pub fn is_punycode_host(url: &Url) -> bool {
    url.host_str()
        .is_some_and(|h| h.starts_with("xn--") || h.contains(".xn--"))
}

/// Texte éditable pour une URL, débarrassé des caractères invisibles.
pub fn display_text_for(url: &Url) -> String {
    url.as_str()
        .chars()
        .filter(|c| !matches!(*c, '\u{200B}'..='\u{200D}' | '\u{2060}' | '\u{FEFF}'))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlBarFocus {
    /// Le clavier va à la page.
    Unfocused,
    /// Vient de recevoir le focus : tout est sélectionné, la prochaine
    /// frappe remplace le contenu.
    Focused,
    /// Édition caractère par caractère.
    Editing,
}

#[derive(Debug)]
pub struct UrlBar {
    text: String,
    /// Offset en octets dans `text`, toujours sur une frontière de caractère.
    cursor: usize,
    focus: UrlBarFocus,
    current_url: Option<Url>,
}

impl Default for UrlBar {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlBar {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            cursor: 0,
            focus: UrlBarFocus::Unfocused,
            current_url: None,
        }
    }

    /// Affiche l'URL de l'onglet actif. Sans effet sur le texte pendant
    /// l'édition, pour ne pas écraser ce que l'utilisateur tape.
    pub fn set_url(&mut self, url: Option<&Url>) {
        if self.current_url.as_ref() == url {
            return;
        }
        self.current_url = url.cloned();
        if self.focus == UrlBarFocus::Unfocused {
            self.restore();
        }
    }

    fn restore(&mut self) {
        self.text = self
            .current_url
            .as_ref()
            .map(display_text_for)
            .unwrap_or_default();
        self.cursor = self.text.len();
    }

    pub fn focus(&mut self) {
        self.focus = UrlBarFocus::Focused;
        self.cursor = self.text.len();
    }

    /// Retire le focus (Escape, clic dans la page) et remet l'URL courante.
    pub fn unfocus(&mut self) {
        self.focus = UrlBarFocus::Unfocused;
        self.restore();
    }

    /// Quitte le mode « tout sélectionné » ; `clear` efface le texte.
    fn start_editing(&mut self, clear: bool) -> bool {
        if self.focus != UrlBarFocus::Focused {
            return false;
        }
        self.focus = UrlBarFocus::Editing;
        if clear {
            self.text.clear();
            self.cursor = 0;
        }
        true
    }

    pub fn insert_char(&mut self, c: char) {
        self.start_editing(true);
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn insert_str(&mut self, s: &str) {
        for c in s.chars().filter(|c| !c.is_control()) {
            self.insert_char(c);
        }
    }

    pub fn backspace(&mut self) {
        if self.start_editing(true) {
            return;
        }
        if let Some(prev) = self.prev_boundary() {
            self.text.drain(prev..self.cursor);
            self.cursor = prev;
        }
    }

    pub fn delete(&mut self) {
        if self.start_editing(true) {
            return;
        }
        if let Some(next) = self.next_boundary() {
            self.text.drain(self.cursor..next);
        }
    }

    pub fn move_cursor_left(&mut self) {
        if self.start_editing(false) {
            self.cursor = 0;
            return;
        }
        if let Some(prev) = self.prev_boundary() {
            self.cursor = prev;
        }
    }

    pub fn move_cursor_right(&mut self) {
        if self.start_editing(false) {
            return;
        }
        if let Some(next) = self.next_boundary() {
            self.cursor = next;
        }
    }

    pub fn home(&mut self) {
        self.start_editing(false);
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.start_editing(false);
        self.cursor = self.text.len();
    }

    pub fn select_all(&mut self) {
        self.focus();
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.text[..self.cursor].char_indices().next_back().map(|(i, _)| i)
    }

    fn next_boundary(&self) -> Option<usize> {
        self.text[self.cursor..]
            .chars()
            .next()
            .map(|c| self.cursor + c.len_utf8())
    }

    /// Valide la saisie (Entrée, bouton Go). Rend le texte à charger, ou
    /// `None` si la barre est vide.
    pub fn submit(&mut self) -> Option<String> {
        let input = self.text.trim().to_owned();
        if input.is_empty() {
            return None;
        }
        self.focus = UrlBarFocus::Unfocused;
        Some(input)
    }

    pub fn is_focused(&self) -> bool {
        self.focus != UrlBarFocus::Unfocused
    }

    pub fn focus_state(&self) -> UrlBarFocus {
        self.focus
    }

    pub fn display_text(&self) -> &str {
        &self.text
    }

    /// Badge à dessiner hors du texte, tant que le texte affiché est celui
    /// de l'URL courante.
    pub fn badge(&self) -> Option<&'static str> {
        let url = self.current_url.as_ref()?;
        (self.focus != UrlBarFocus::Editing && is_punycode_host(url)).then_some(PUNYCODE_BADGE)
    }

    /// Nombre de caractères avant le curseur (pour le rendu).
    pub fn cursor_char_offset(&self) -> usize {
        self.text[..self.cursor].chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_set_url_updates_when_unfocused() {
        let mut bar = UrlBar::new();
        bar.set_url(Some(&url("https://example.com/path")));
        assert_eq!(bar.display_text(), "https://example.com/path");
        assert_eq!(bar.cursor_char_offset(), bar.display_text().chars().count());
    }

    #[test]
    fn test_set_url_does_not_clobber_typing() {
        let mut bar = UrlBar::new();
        bar.set_url(Some(&url("https://a.example/")));
        bar.focus();
        bar.insert_str("rust-lang.org");
        bar.set_url(Some(&url("https://b.example/")));
        assert_eq!(bar.display_text(), "rust-lang.org");

        bar.unfocus();
        assert_eq!(bar.display_text(), "https://b.example/");
    }

    #[test]
    fn test_first_key_after_focus_replaces_text() {
        let mut bar = UrlBar::new();
        bar.set_url(Some(&url("https://duckduckgo.com/")));
        bar.focus();
        bar.insert_char('e');
        assert_eq!(bar.display_text(), "e");
        assert_eq!(bar.focus_state(), UrlBarFocus::Editing);
    }

    #[test]
    fn test_editing_in_the_middle() {
        let mut bar = UrlBar::new();
        bar.focus();
        bar.insert_str("exmple.com");
        bar.home();
        bar.move_cursor_right();
        bar.move_cursor_right();
        bar.insert_char('a');
        assert_eq!(bar.display_text(), "example.com");

        bar.end();
        bar.backspace();
        assert_eq!(bar.display_text(), "example.co");
        bar.home();
        bar.delete();
        assert_eq!(bar.display_text(), "xample.co");
    }

    #[test]
    fn test_multibyte_cursor_moves() {
        let mut bar = UrlBar::new();
        bar.focus();
        bar.insert_str("é€x");
        bar.move_cursor_left();
        bar.move_cursor_left();
        assert_eq!(bar.cursor_char_offset(), 1);
        bar.backspace();
        assert_eq!(bar.display_text(), "€x");
    }

    #[test]
    fn test_backspace_when_all_selected_clears() {
        let mut bar = UrlBar::new();
        bar.set_url(Some(&url("https://example.com/")));
        bar.focus();
        bar.backspace();
        assert_eq!(bar.display_text(), "");
    }

    #[test]
    fn test_submit_returns_trimmed_text_and_unfocuses() {
        let mut bar = UrlBar::new();
        bar.focus();
        bar.insert_str("  example.com ");
        assert_eq!(bar.submit().as_deref(), Some("example.com"));
        assert!(!bar.is_focused());
    }

    #[test]
    fn test_submit_empty_is_none() {
        let mut bar = UrlBar::new();
        bar.focus();
        bar.insert_str("   ");
        assert_eq!(bar.submit(), None);
        assert!(bar.is_focused());
    }

    #[test]
    fn test_control_characters_ignored() {
        let mut bar = UrlBar::new();
        bar.focus();
        bar.insert_str("a\u{7f}b\r");
        assert_eq!(bar.display_text(), "ab");
    }

    #[test]
    fn test_punycode_is_flagged_outside_the_text() {
        let mut bar = UrlBar::new();
        bar.set_url(Some(&url("https://xn--ggle-0nd.com/")));
        assert_eq!(bar.display_text(), "https://xn--ggle-0nd.com/");
        assert_eq!(bar.badge(), Some(PUNYCODE_BADGE));
        assert!(is_punycode_host(&url("https://www.xn--80ak6aa92e.com/")));
    }

    #[test]
    fn test_unedited_punycode_url_submits_a_loadable_url() {
        let mut bar = UrlBar::new();
        bar.set_url(Some(&url("https://xn--80ak6aa92e.com/")));
        bar.focus();
        let text = bar.submit().unwrap();
        assert_eq!(
            crate::shell::normalize_url(&text),
            Some(url("https://xn--80ak6aa92e.com/"))
        );
    }

    #[test]
    fn test_badge_hidden_while_editing() {
        let mut bar = UrlBar::new();
        bar.set_url(Some(&url("https://xn--ggle-0nd.com/")));
        bar.focus();
        assert!(bar.badge().is_some());
        bar.insert_str("example.com");
        assert_eq!(bar.badge(), None);
        bar.unfocus();
        assert!(bar.badge().is_some());
    }

    #[test]
    fn test_no_badge_for_plain_domain() {
        let mut bar = UrlBar::new();
        bar.set_url(Some(&url("https://google.com/")));
        assert_eq!(bar.badge(), None);
    }

    #[test]
    fn test_plain_domain_unchanged() {
        let u = url("https://google.com/path?query=value");
        assert_eq!(display_text_for(&u), u.as_str());
    }
}
