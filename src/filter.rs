//! Request filtering policy.
//!
//! Every request a tab is about to perform is described by a
//! [`NavigationRequest`] and checked against [`NavigationFilter::should_allow`].
//! Explicit top-level navigations (a link the user clicked, a URL the user
//! typed) always go through. Everything else is checked against the
//! [`BlockList`]: that is where embedded ads and trackers are loaded.
//!
//! The filter knows nothing about Servo. The engine glue builds the request
//! descriptor from whatever the engine reports.

use std::sync::Arc;

use crate::blocklist::BlockList;

/// Why the engine is about to perform a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationType {
    /// The user activated a link in the page.
    LinkClicked,
    /// The user submitted a URL (address bar, Home, new tab).
    Typed,
    /// Anything else: sub-resources, redirects, scripts, history traversal.
    Other,
}

/// Which browsing context the request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameTarget {
    TopLevel,
    SubResource,
}

/// One engine-originated check.
#[derive(Debug, Clone, Copy)]
pub struct NavigationRequest<'a> {
    pub url: &'a str,
    pub navigation_type: NavigationType,
    pub frame: FrameTarget,
}

impl<'a> NavigationRequest<'a> {
    pub fn new(url: &'a str, navigation_type: NavigationType, frame: FrameTarget) -> Self {
        Self {
            url,
            navigation_type,
            frame,
        }
    }

    /// A background fetch (image, script, stylesheet, iframe...).
    pub fn sub_resource(url: &'a str) -> Self {
        Self::new(url, NavigationType::Other, FrameTarget::SubResource)
    }

    /// `true` for navigations the user explicitly asked for in the main frame.
    pub fn is_explicit(&self) -> bool {
        self.frame == FrameTarget::TopLevel
            && matches!(
                self.navigation_type,
                NavigationType::LinkClicked | NavigationType::Typed
            )
    }
}

/// Per-tab filter bound to the process-wide block-list.
///
/// Cloning is cheap: the list itself is shared.
#[derive(Debug, Clone)]
pub struct NavigationFilter {
    blocklist: Arc<BlockList>,
}

impl NavigationFilter {
    pub fn new(blocklist: Arc<BlockList>) -> Self {
        Self { blocklist }
    }

    /// Decides whether the engine may perform `request`.
    pub fn should_allow(&self, request: &NavigationRequest<'_>) -> bool {
        if request.is_explicit() {
            return true;
        }
        !self.blocklist.matches(request.url)
    }

    /// The block-list entry responsible for denying `request`, if any.
    pub fn blocking_entry<'s>(&'s self, request: &NavigationRequest<'_>) -> Option<&'s str> {
        if request.is_explicit() {
            return None;
        }
        self.blocklist.matching_entry(request.url)
    }

    pub fn blocklist(&self) -> &Arc<BlockList> {
        &self.blocklist
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn filter(entries: &[&str]) -> NavigationFilter {
        NavigationFilter::new(Arc::new(BlockList::from_entries(entries.iter().copied())))
    }

    const ALL_TYPES: [NavigationType; 3] = [
        NavigationType::LinkClicked,
        NavigationType::Typed,
        NavigationType::Other,
    ];

    #[test]
    fn test_explicit_top_level_always_allowed() {
        let f = filter(&["doubleclick.net"]);
        let url = "https://ads.doubleclick.net/landing";
        for kind in [NavigationType::LinkClicked, NavigationType::Typed] {
            let request = NavigationRequest::new(url, kind, FrameTarget::TopLevel);
            assert!(f.should_allow(&request), "{kind:?} should bypass the list");
            assert_eq!(f.blocking_entry(&request), None);
        }
    }

    #[test]
    fn test_implicit_top_level_is_checked() {
        let f = filter(&["doubleclick.net"]);
        let request = NavigationRequest::new(
            "https://ads.doubleclick.net/redirect",
            NavigationType::Other,
            FrameTarget::TopLevel,
        );
        assert!(!f.should_allow(&request));
    }

    #[test]
    fn test_sub_resources_checked_whatever_the_trigger() {
        let f = filter(&["tracker.example"]);
        for kind in ALL_TYPES {
            let blocked = NavigationRequest::new(
                "https://cdn.tracker.example/pixel.gif",
                kind,
                FrameTarget::SubResource,
            );
            let clean =
                NavigationRequest::new("https://example.com/a.js", kind, FrameTarget::SubResource);
            assert!(!f.should_allow(&blocked), "{kind:?} sub-resource should be checked");
            assert!(f.should_allow(&clean));
        }
    }

    #[test]
    fn test_empty_list_allows_everything() {
        let f = filter(&[]);
        for kind in ALL_TYPES {
            for frame in [FrameTarget::TopLevel, FrameTarget::SubResource] {
                let request = NavigationRequest::new("https://ads.doubleclick.net/x", kind, frame);
                assert!(f.should_allow(&request));
            }
        }
    }

    #[test]
    fn test_blocking_entry_names_the_match() {
        let f = filter(&["nothing.here", "adserver.example"]);
        let request = NavigationRequest::sub_resource("https://adserver.example/banner");
        assert_eq!(f.blocking_entry(&request), Some("adserver.example"));
    }

    #[test]
    fn test_file_backed_list() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "doubleclick.net\nadserver.example\n").unwrap();
        let f = NavigationFilter::new(Arc::new(BlockList::load(file.path())));

        assert!(!f.should_allow(&NavigationRequest::sub_resource("https://ads.doubleclick.net/x")));
        assert!(f.should_allow(&NavigationRequest::sub_resource("https://example.com/img.png")));
    }

    #[test]
    fn test_clones_share_the_list() {
        let f = filter(&["a.example"]);
        let g = f.clone();
        assert!(Arc::ptr_eq(f.blocklist(), g.blocklist()));
    }
}
