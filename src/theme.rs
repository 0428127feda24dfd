//! Terminal theme detection
//!
//! Detection order, first hit wins:
//! 1. DIFFPANE_THEME environment variable (explicit override)
//! 2. OSC 11 terminal query (queries the actual background colour)
//! 3. COLORFGBG environment variable (set by xterm, rxvt and others)

use clap::ValueEnum;
use std::io::{IsTerminal, Read, Write};
use std::time::Duration;

/// Theme mode for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

impl ThemeMode {
    pub fn detect() -> Self {
        let detectors: [fn() -> Option<Self>; 3] = [
            Self::from_env,
            Self::query_terminal_background,
            Self::from_colorfgbg,
        ];
        detectors
            .iter()
            .find_map(|detect| detect())
            .unwrap_or_default()
    }

    fn from_env() -> Option<Self> {
        Self::parse_name(&std::env::var("DIFFPANE_THEME").ok()?)
    }

    fn parse_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    /// COLORFGBG is "fg;bg"; ANSI backgrounds 7 and 9+ are light
    fn from_colorfgbg() -> Option<Self> {
        Self::parse_colorfgbg(&std::env::var("COLORFGBG").ok()?)
    }

    fn parse_colorfgbg(value: &str) -> Option<Self> {
        let bg: u8 = value.rsplit(';').next()?.parse().ok()?;
        if bg == 7 || bg > 8 {
            Some(Self::Light)
        } else {
            Some(Self::Dark)
        }
    }

    #[cfg(unix)]
    fn query_terminal_background() -> Option<Self> {
        use nix::sys::termios::{cfmakeraw, tcgetattr, tcsetattr, LocalFlags, SetArg};

        let stdin = std::io::stdin();
        if !stdin.is_terminal() {
            return None;
        }

        let original = tcgetattr(&stdin).ok()?;
        let mut raw = original.clone();
        cfmakeraw(&mut raw);
        raw.local_flags.insert(LocalFlags::ISIG);
        tcsetattr(&stdin, SetArg::TCSANOW, &raw).ok()?;

        // BEL terminator for wider compatibility
        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(b"\x1b]11;?\x07");
        let _ = stdout.flush();

        let response = read_osc_response(&stdin, Duration::from_millis(200));
        let _ = tcsetattr(&stdin, SetArg::TCSANOW, &original);

        Self::parse_osc11_response(&response)
    }

    #[cfg(not(unix))]
    fn query_terminal_background() -> Option<Self> {
        None
    }

    /// Response format: `ESC ] 11 ; rgb:RRRR/GGGG/BBBB BEL` (2 or 4 hex digits)
    fn parse_osc11_response(response: &str) -> Option<Self> {
        let rgb = &response[response.find("rgb:")? + 4..];
        let rgb = rgb.split(['\x07', '\x1b']).next()?;

        let channels: Vec<u8> = rgb
            .split('/')
            .map(|hex| {
                let value = u16::from_str_radix(hex, 16).ok()?;
                Some(if hex.len() > 2 { (value >> 8) as u8 } else { value as u8 })
            })
            .collect::<Option<_>>()?;
        let [r, g, b] = channels[..] else {
            return None;
        };

        // ITU-R BT.709 relative luminance
        let luminance = 0.2126 * f64::from(r) + 0.7152 * f64::from(g) + 0.0722 * f64::from(b);
        if luminance > 128.0 {
            Some(Self::Light)
        } else {
            Some(Self::Dark)
        }
    }
}

#[cfg(unix)]
fn read_osc_response(stdin: &std::io::Stdin, timeout: Duration) -> String {
    use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
    use std::os::fd::AsFd;

    let mut response = Vec::new();
    let mut byte = [0u8; 1];
    let deadline = std::time::Instant::now() + timeout;
    let mut fds = [PollFd::new(stdin.as_fd(), PollFlags::POLLIN)];

    loop {
        let remaining = deadline.saturating_duration_since(std::time::Instant::now());
        if remaining.is_zero() {
            break;
        }
        let timeout_ms = remaining.as_millis().min(u128::from(u16::MAX)) as u16;
        if poll(&mut fds, PollTimeout::from(timeout_ms)).unwrap_or(0) == 0 {
            break;
        }
        if std::io::stdin().read(&mut byte).unwrap_or(0) != 1 {
            break;
        }
        response.push(byte[0]);
        if byte[0] == 0x07 || response.ends_with(b"\x1b\\") {
            break;
        }
    }

    String::from_utf8_lossy(&response).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn osc11_four_digit_channels() {
        assert_eq!(
            ThemeMode::parse_osc11_response("\x1b]11;rgb:ffff/ffff/ffff\x07"),
            Some(ThemeMode::Light)
        );
        assert_eq!(
            ThemeMode::parse_osc11_response("\x1b]11;rgb:0000/0000/0000\x1b\\"),
            Some(ThemeMode::Dark)
        );
    }

    #[test]
    fn osc11_two_digit_channels() {
        assert_eq!(
            ThemeMode::parse_osc11_response("\x1b]11;rgb:fd/f6/e3\x07"),
            Some(ThemeMode::Light)
        );
        assert_eq!(
            ThemeMode::parse_osc11_response("\x1b]11;rgb:1e/1e/2e\x07"),
            Some(ThemeMode::Dark)
        );
    }

    #[test]
    fn osc11_invalid() {
        assert_eq!(ThemeMode::parse_osc11_response(""), None);
        assert_eq!(ThemeMode::parse_osc11_response("rgb:zz/00/00"), None);
        assert_eq!(ThemeMode::parse_osc11_response("rgb:00/00"), None);
    }

    #[test]
    fn colorfgbg_values() {
        assert_eq!(ThemeMode::parse_colorfgbg("0;15"), Some(ThemeMode::Light));
        assert_eq!(ThemeMode::parse_colorfgbg("0;7"), Some(ThemeMode::Light));
        assert_eq!(ThemeMode::parse_colorfgbg("15;0"), Some(ThemeMode::Dark));
        assert_eq!(ThemeMode::parse_colorfgbg("15;default"), None);
    }

    #[test]
    fn theme_names() {
        assert_eq!(ThemeMode::parse_name("Light"), Some(ThemeMode::Light));
        assert_eq!(ThemeMode::parse_name(" dark "), Some(ThemeMode::Dark));
        assert_eq!(ThemeMode::parse_name("solarized"), None);
    }
}
