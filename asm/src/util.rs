use color_print::cformat;

use crate::symtab::SymbolTable;

/// One listing row per defined label, in order of first mention.
pub fn label_listing(symbols: &SymbolTable, color: bool) -> Vec<String> {
    symbols
        .iter()
        .filter_map(|(_, sym)| sym.address().map(|addr| (sym, addr)))
        .map(|(sym, addr)| {
            let flags = match (sym.exported, sym.referenced) {
                (true, _) => "export",
                (false, true) => "",
                (false, false) => "unused",
            };
            let row = if color {
                cformat!("[{:05X}] <g>{:<24}</> <c>{}</>", addr, sym.name, flags)
            } else {
                format!("[{:05X}] {:<24} {}", addr, sym.name, flags)
            };
            row.trim_end().to_string()
        })
        .collect()
}

pub fn print_labels(symbols: &SymbolTable, color: bool) {
    println!("--------+-----------------------------------------------------------");
    for row in label_listing(symbols, color) {
        println!("{}", row);
    }
    println!("--------+-----------------------------------------------------------");
}

#[cfg(test)]
mod tests {
    use super::*;
    use xpvm_arch::Format;

    #[test]
    fn listing_rows() {
        let mut symbols = SymbolTable::new();
        symbols.install_definition("main", 0).expect("defined");
        symbols.install_reference("loop", 3, Format::Addr);
        symbols.install_definition("loop", 2).expect("defined");
        symbols.install_import("ext").expect("imported");
        symbols.install_export("main").expect("exported");
        symbols.install_definition("spare", 0x1F).expect("defined");

        assert_eq!(
            label_listing(&symbols, false),
            vec![
                format!("[00000] {:<24} export", "main"),
                "[00002] loop".to_string(),
                format!("[0001F] {:<24} unused", "spare"),
            ]
        );
    }
}
