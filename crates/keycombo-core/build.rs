use std::env;
use std::fs::File;
use std::io::Write;
use std::path::Path;

fn main() {
    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("scancode_codes.rs");
    let mut f = File::create(&dest_path).unwrap();

    // Generate the Scancode newtype wrapper
    writeln!(
        f,
        r#"
/// Represents a single physical key in the canonical enumeration.
///
/// This is a newtype wrapper around u16 for type safety.
/// The numeric values follow the USB HID keyboard usage page,
/// with `0` reserved as the UNKNOWN sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct Scancode(pub u16);

impl Scancode {{
    /// Get the raw numeric code value
    pub fn code(self) -> u16 {{
        self.0
    }}

    /// Get the persisted token for this scancode, if it has one
    pub fn token(self) -> Option<&'static str> {{
        scancode_to_token(self)
    }}
}}

impl From<u16> for Scancode {{
    fn from(code: u16) -> Self {{
        Scancode(code)
    }}
}}

impl From<Scancode> for u16 {{
    fn from(scancode: Scancode) -> Self {{
        scancode.0
    }}
}}

impl fmt::Display for Scancode {{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {{
        write!(f, "{{}}", self.token().unwrap_or(UNKNOWN_TOKEN))
    }}
}}

impl FromStr for Scancode {{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {{
        let scancode = token_to_scancode(s);
        if scancode.is_unknown() {{
            Err(format!("Unknown scancode token: {{}}", s))
        }} else {{
            Ok(scancode)
        }}
    }}
}}
"#
    )
    .unwrap();

    println!("cargo:rerun-if-changed=build.rs");
}
