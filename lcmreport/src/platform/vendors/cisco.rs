//! Cisco platform definitions.
//!
//! Polling only issues `show` commands, so every Cisco platform shares one
//! prompt pattern matching both user EXEC and privileged EXEC:
//!
//! ```text
//! switch01>          # user EXEC
//! switch01#          # privileged EXEC
//! core-sw.lab#       # dotted hostnames
//! ```
//!
//! Device type names follow the usual netmiko/scrapli naming so existing
//! inventories work unchanged.

use crate::error::Result;
use crate::platform::PlatformDefinition;

/// Trailing EXEC prompt, anchored at the very end of the buffer.
const EXEC_PROMPT: &str = r"(?m)^[\w.\-@/:()]{1,63}[>#]\s*\z";

/// IOS and IOS-XE share failure markers and terminal setup.
fn ios_family(name: &str) -> Result<PlatformDefinition> {
    Ok(PlatformDefinition::new(name, EXEC_PROMPT)?
        .with_failure_pattern("% Ambiguous command")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Invalid input detected")
        .with_failure_pattern("% Unknown command")
        .with_on_open_command("terminal length 0")
        .with_on_open_command("terminal width 511")
        .with_terminal_size(511, 24))
}

/// Cisco IOS-XE (Catalyst 9000 and friends).
pub fn iosxe() -> Result<PlatformDefinition> {
    ios_family("cisco_xe")
}

/// Classic Cisco IOS.
pub fn ios() -> Result<PlatformDefinition> {
    ios_family("cisco_ios")
}

/// Cisco NX-OS.
pub fn nxos() -> Result<PlatformDefinition> {
    Ok(PlatformDefinition::new("cisco_nxos", EXEC_PROMPT)?
        .with_failure_pattern("% Ambiguous command")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Invalid command")
        .with_failure_pattern("Syntax error while parsing")
        .with_on_open_command("terminal length 0")
        .with_on_open_command("terminal width 511")
        .with_terminal_size(511, 24))
}
