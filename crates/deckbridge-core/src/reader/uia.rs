//! UI Automation reader for the mixer window.
//!
//! Finds the top-level window by title, walks its descendants for the
//! anchor element and keeps the anchor's parent as the deck container.
//! Deck text lives in fixed children of that container.

use crate::config::ReaderConfig;
use crate::error::ReaderError;
use crate::reader::{ElementBounds, ReaderPort, WindowHealth};

#[cfg(target_os = "windows")]
pub use imp::UiaReader;

#[cfg(target_os = "windows")]
mod imp {
    use std::thread;

    use tracing::{debug, info};
    use windows::Win32::Foundation::{BOOL, HWND, LPARAM, RECT};
    use windows::Win32::System::Com::{
        CLSCTX_INPROC_SERVER, COINIT_MULTITHREADED, CoCreateInstance, CoInitializeEx,
    };
    use windows::Win32::UI::Accessibility::{
        CUIAutomation, IUIAutomation, IUIAutomationCondition, IUIAutomationElement,
        IUIAutomationElementArray, TreeScope_Children, TreeScope_Descendants,
    };
    use windows::Win32::UI::WindowsAndMessaging::{
        EnumWindows, GetWindowRect, GetWindowTextW, IsIconic, IsWindow, IsWindowVisible, SW_RESTORE, ShowWindow,
    };

    use super::*;

    fn platform(e: windows::core::Error) -> ReaderError {
        ReaderError::Platform(e.to_string())
    }

    fn bounds(rect: RECT) -> ElementBounds {
        ElementBounds {
            left: rect.left,
            top: rect.top,
            right: rect.right,
            bottom: rect.bottom,
        }
    }

    struct Automation {
        client: IUIAutomation,
        all: IUIAutomationCondition,
    }

    impl Automation {
        fn create() -> Result<Self, ReaderError> {
            // SAFETY: initializes COM for the calling thread. S_FALSE (already
            // initialized) and RPC_E_CHANGED_MODE both leave COM usable.
            let init = unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) };
            if let Err(e) = init.ok() {
                debug!("CoInitializeEx: {}", e);
            }

            // SAFETY: CUIAutomation is the documented in-process UIA client class.
            let client: IUIAutomation =
                unsafe { CoCreateInstance(&CUIAutomation, None, CLSCTX_INPROC_SERVER) }
                    .map_err(platform)?;
            // SAFETY: plain COM call on a live interface.
            let all = unsafe { client.CreateTrueCondition() }.map_err(platform)?;

            Ok(Self { client, all })
        }
    }

    /// UI Automation backed [`ReaderPort`].
    ///
    /// COM objects are bound to the thread that created them, so the reader
    /// must be created and used on the polling thread.
    pub struct UiaReader {
        config: ReaderConfig,
        automation: Option<Automation>,
        window: Option<HWND>,
        container: Option<IUIAutomationElement>,
        children: Option<IUIAutomationElementArray>,
    }

    impl UiaReader {
        pub fn new(config: ReaderConfig) -> Self {
            Self {
                config,
                automation: None,
                window: None,
                container: None,
                children: None,
            }
        }

        fn automation(&mut self) -> Result<&Automation, ReaderError> {
            if self.automation.is_none() {
                self.automation = Some(Automation::create()?);
            }
            self.automation.as_ref().ok_or(ReaderError::NotConnected)
        }

        fn find_container(&mut self, hwnd: HWND) -> Result<IUIAutomationElement, ReaderError> {
            let anchor = self.config.anchor.clone();
            let automation = self.automation()?;

            // SAFETY: COM calls on live interfaces; hwnd was just returned by
            // EnumWindows and is only used as an identifier.
            unsafe {
                let root = automation.client.ElementFromHandle(hwnd).map_err(platform)?;
                let descendants = root
                    .FindAll(TreeScope_Descendants, &automation.all)
                    .map_err(platform)?;
                let count = descendants.Length().map_err(platform)?;

                for i in 0..count {
                    let element = descendants.GetElement(i).map_err(platform)?;
                    let name = element.CurrentName().map(|s| s.to_string()).unwrap_or_default();
                    if name == anchor {
                        let walker = automation.client.RawViewWalker().map_err(platform)?;
                        return walker.GetParentElement(&element).map_err(platform);
                    }
                }
            }

            Err(ReaderError::AnchorNotFound(anchor))
        }

        fn children(&mut self) -> Result<&IUIAutomationElementArray, ReaderError> {
            if self.children.is_none() {
                let container = self.container.clone().ok_or(ReaderError::NotConnected)?;
                let all = self.automation()?.all.clone();
                // SAFETY: COM call on a live interface.
                let children = unsafe { container.FindAll(TreeScope_Children, &all) }
                    .map_err(|e| {
                        self.container = None;
                        platform(e)
                    })?;
                self.children = Some(children);
            }
            self.children.as_ref().ok_or(ReaderError::NotConnected)
        }

        fn element_at(&mut self, index: usize) -> Result<IUIAutomationElement, ReaderError> {
            let children = self.children()?;
            // SAFETY: COM calls on a live interface; the index is range-checked.
            unsafe {
                let len = children.Length().map_err(platform)?.max(0) as usize;
                if index >= len {
                    return Err(ReaderError::ElementMissing(index));
                }
                children.GetElement(index as i32).map_err(platform)
            }
        }
    }

    impl ReaderPort for UiaReader {
        fn connect(&mut self) -> Result<(), ReaderError> {
            self.disconnect();

            let hwnd = find_window(&self.config.window_title, self.config.require_visible)
                .ok_or_else(|| ReaderError::WindowNotFound(self.config.window_title.clone()))?;

            // A minimized window has no deck elements to find.
            // SAFETY: IsIconic/ShowWindow accept any HWND.
            if unsafe { IsIconic(hwnd) }.as_bool() {
                info!("Window is minimized, restoring before connecting");
                let _ = unsafe { ShowWindow(hwnd, SW_RESTORE) };
                thread::sleep(self.config.connect_settle());
            }

            let container = self.find_container(hwnd)?;
            self.window = Some(hwnd);
            self.container = Some(container);
            Ok(())
        }

        fn check_health(&mut self) -> Result<WindowHealth, ReaderError> {
            let hwnd = self.window.ok_or(ReaderError::NotConnected)?;

            // SAFETY: IsWindow/IsIconic accept any HWND, including stale ones.
            if !unsafe { IsWindow(hwnd) }.as_bool() {
                self.disconnect();
                return Err(ReaderError::WindowGone);
            }
            if unsafe { IsIconic(hwnd) }.as_bool() {
                return Ok(WindowHealth::Minimized);
            }
            Ok(WindowHealth::Alive)
        }

        fn restore(&mut self) -> Result<(), ReaderError> {
            let hwnd = self.window.ok_or(ReaderError::NotConnected)?;
            // SAFETY: ShowWindow accepts any HWND; the return value is the
            // previous visibility, not an error.
            let _ = unsafe { ShowWindow(hwnd, SW_RESTORE) };
            self.children = None;
            Ok(())
        }

        fn child_count(&mut self) -> Result<usize, ReaderError> {
            // Each layout check starts from a fresh child list.
            self.children = None;
            let children = self.children()?;
            // SAFETY: COM call on a live interface.
            let len = unsafe { children.Length() }.map_err(platform)?;
            Ok(len.max(0) as usize)
        }

        fn text_at(&mut self, index: usize) -> Result<String, ReaderError> {
            let element = self.element_at(index)?;
            // SAFETY: COM call on a live interface.
            unsafe { element.CurrentName() }
                .map(|name| name.to_string())
                .map_err(platform)
        }

        fn window_bounds(&mut self) -> Result<Option<ElementBounds>, ReaderError> {
            let hwnd = self.window.ok_or(ReaderError::NotConnected)?;
            let mut rect = RECT::default();
            // SAFETY: GetWindowRect writes into a local RECT and fails on a
            // stale HWND.
            unsafe { GetWindowRect(hwnd, &mut rect) }.map_err(platform)?;
            Ok(Some(bounds(rect)))
        }

        fn bounds_at(&mut self, index: usize) -> Result<Option<ElementBounds>, ReaderError> {
            let element = self.element_at(index)?;
            // SAFETY: COM call on a live interface.
            let rect = unsafe { element.CurrentBoundingRectangle() }.map_err(platform)?;
            Ok(Some(bounds(rect)))
        }

        fn disconnect(&mut self) {
            self.window = None;
            self.container = None;
            self.children = None;
        }
    }

    struct WindowSearch {
        needle: String,
        require_visible: bool,
        found: Option<HWND>,
    }

    /// Find the first top-level window whose title contains `title`
    /// (case-insensitive).
    fn find_window(title: &str, require_visible: bool) -> Option<HWND> {
        let mut search = WindowSearch {
            needle: title.to_lowercase(),
            require_visible,
            found: None,
        };

        // SAFETY: the callback only runs during EnumWindows, while `search`
        // is alive. EnumWindows reports an error when the callback stops the
        // enumeration early, which is the success case here.
        unsafe {
            let _ = EnumWindows(
                Some(enum_callback),
                LPARAM(&mut search as *mut WindowSearch as isize),
            );
        }

        search.found
    }

    unsafe extern "system" fn enum_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
        // SAFETY: lparam is the &mut WindowSearch passed by find_window.
        let search = unsafe { &mut *(lparam.0 as *mut WindowSearch) };

        if search.require_visible && !unsafe { IsWindowVisible(hwnd) }.as_bool() {
            return BOOL(1);
        }

        let mut buf = [0u16; 512];
        let len = unsafe { GetWindowTextW(hwnd, &mut buf) };
        if len > 0 {
            let title = String::from_utf16_lossy(&buf[..len as usize]);
            if title.to_lowercase().contains(&search.needle) {
                search.found = Some(hwnd);
                return BOOL(0); // Stop enumeration
            }
        }
        BOOL(1) // Continue enumeration
    }
}

// --- Non-Windows stub ---

/// UI Automation is Windows-only; elsewhere every call fails softly.
#[cfg(not(target_os = "windows"))]
pub struct UiaReader {
    _config: ReaderConfig,
}

#[cfg(not(target_os = "windows"))]
impl UiaReader {
    pub fn new(config: ReaderConfig) -> Self {
        Self { _config: config }
    }
}

#[cfg(not(target_os = "windows"))]
impl ReaderPort for UiaReader {
    fn connect(&mut self) -> Result<(), ReaderError> {
        Err(ReaderError::Unsupported)
    }

    fn check_health(&mut self) -> Result<WindowHealth, ReaderError> {
        Err(ReaderError::Unsupported)
    }

    fn restore(&mut self) -> Result<(), ReaderError> {
        Err(ReaderError::Unsupported)
    }

    fn child_count(&mut self) -> Result<usize, ReaderError> {
        Err(ReaderError::Unsupported)
    }

    fn text_at(&mut self, _index: usize) -> Result<String, ReaderError> {
        Err(ReaderError::Unsupported)
    }

    fn disconnect(&mut self) {}
}
