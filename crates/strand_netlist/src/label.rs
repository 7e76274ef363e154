//! Label normalisation and identifier validity per HDL dialect.
//!
//! Labels are free text in the editor. Before they are compared or used as
//! instance names they are normalised with [`correct_label`]; comparisons are
//! case-insensitive because VHDL identifiers are.

use strand_config::HdlDialect;

const VHDL_KEYWORDS: &[&str] = &[
    "ABS", "ACCESS", "AFTER", "ALIAS", "ALL", "AND", "ARCHITECTURE", "ARRAY", "ASSERT",
    "ATTRIBUTE", "BEGIN", "BLOCK", "BODY", "BUFFER", "BUS", "CASE", "COMPONENT",
    "CONFIGURATION", "CONSTANT", "DISCONNECT", "DOWNTO", "ELSE", "ELSIF", "END", "ENTITY",
    "EXIT", "FILE", "FOR", "FUNCTION", "GENERATE", "GENERIC", "GROUP", "GUARDED", "IF",
    "IMPURE", "IN", "INERTIAL", "INOUT", "IS", "LABEL", "LIBRARY", "LINKAGE", "LITERAL",
    "LOOP", "MAP", "MOD", "NAND", "NEW", "NEXT", "NOR", "NOT", "NULL", "OF", "ON", "OPEN",
    "OR", "OTHERS", "OUT", "PACKAGE", "PORT", "POSTPONED", "PROCEDURE", "PROCESS", "PURE",
    "RANGE", "RECORD", "REGISTER", "REJECT", "REM", "REPORT", "RETURN", "ROL", "ROR",
    "SELECT", "SEVERITY", "SIGNAL", "SHARED", "SLA", "SLL", "SRA", "SRL", "SUBTYPE", "THEN",
    "TO", "TRANSPORT", "TYPE", "UNAFFECTED", "UNITS", "UNTIL", "USE", "VARIABLE", "WAIT",
    "WHEN", "WHILE", "WITH", "XNOR", "XOR",
];

const VERILOG_KEYWORDS: &[&str] = &[
    "ALWAYS", "AND", "ASSIGN", "AUTOMATIC", "BEGIN", "BUF", "BUFIF0", "BUFIF1", "CASE",
    "CASEX", "CASEZ", "CELL", "CMOS", "CONFIG", "DEASSIGN", "DEFAULT", "DEFPARAM", "DESIGN",
    "DISABLE", "EDGE", "ELSE", "END", "ENDCASE", "ENDCONFIG", "ENDFUNCTION", "ENDGENERATE",
    "ENDMODULE", "ENDPRIMITIVE", "ENDSPECIFY", "ENDTABLE", "ENDTASK", "EVENT", "FOR", "FORCE",
    "FOREVER", "FORK", "FUNCTION", "GENERATE", "GENVAR", "HIGHZ0", "HIGHZ1", "IF", "IFNONE",
    "INCDIR", "INCLUDE", "INITIAL", "INOUT", "INPUT", "INSTANCE", "INTEGER", "JOIN", "LARGE",
    "LIBLIST", "LIBRARY", "LOCALPARAM", "MACROMODULE", "MEDIUM", "MODULE", "NAND",
    "NEGEDGE", "NMOS", "NOR", "NOSHOWCANCELLED", "NOT", "NOTIF0", "NOTIF1", "OR", "OUTPUT",
    "PARAMETER", "PMOS", "POSEDGE", "PRIMITIVE", "PULL0", "PULL1", "PULLDOWN", "PULLUP",
    "PULSESTYLE_ONEVENT", "PULSESTYLE_ONDETECT", "RCMOS", "REAL", "REALTIME", "REG",
    "RELEASE", "REPEAT", "RNMOS", "RPMOS", "RTRAN", "RTRANIF0", "RTRANIF1", "SCALARED",
    "SHOWCANCELLED", "SIGNED", "SMALL", "SPECIFY", "SPECPARAM", "STRONG0", "STRONG1",
    "SUPPLY0", "SUPPLY1", "TABLE", "TASK", "TIME", "TRAN", "TRANIF0", "TRANIF1", "TRI",
    "TRI0", "TRI1", "TRIAND", "TRIOR", "TRIREG", "UNSIGNED", "USE", "UWIRE", "VECTORED",
    "WAIT", "WAND", "WEAK0", "WEAK1", "WHILE", "WIRE", "WOR", "XNOR", "XOR",
];

/// Normalises a free-text label into an identifier-shaped string.
///
/// Every character that is not an ASCII letter, digit or `_` becomes `_`, and
/// a label starting with a digit gets an `L_` prefix. Surrounding whitespace
/// is dropped; an empty label stays empty.
pub fn correct_label(label: &str) -> String {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let mut out = String::with_capacity(trimmed.len() + 2);
    if trimmed.starts_with(|c: char| c.is_ascii_digit()) {
        out.push_str("L_");
    }
    out.extend(trimmed.chars().map(|c| {
        if c.is_ascii_alphanumeric() || c == '_' {
            c
        } else {
            '_'
        }
    }));
    out
}

/// Returns the case-folded key used to compare labels.
pub fn label_key(label: &str) -> String {
    correct_label(label).to_ascii_uppercase()
}

/// Returns `true` if `word` is reserved in `dialect`.
pub fn is_reserved(word: &str, dialect: HdlDialect) -> bool {
    let upper = word.to_ascii_uppercase();
    let keywords = match dialect {
        HdlDialect::Vhdl => VHDL_KEYWORDS,
        HdlDialect::Verilog => VERILOG_KEYWORDS,
    };
    keywords.contains(&upper.as_str())
}

/// Returns `true` if `name` can be used verbatim as an identifier in `dialect`.
pub fn is_valid_identifier(name: &str, dialect: HdlDialect) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let first_ok = match dialect {
        HdlDialect::Vhdl => first.is_ascii_alphabetic(),
        HdlDialect::Verilog => first.is_ascii_alphabetic() || first == '_',
    };
    if !first_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return false;
    }
    if dialect == HdlDialect::Vhdl && (name.contains("__") || name.ends_with('_')) {
        return false;
    }
    !is_reserved(name, dialect)
}

/// Returns `true` if the normalised form of `label` is a valid identifier.
pub fn is_valid_label(label: &str, dialect: HdlDialect) -> bool {
    is_valid_identifier(&correct_label(label), dialect)
}
