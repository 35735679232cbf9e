mod controls;
mod details;
mod panels;

/// Writing styles offered for the prompt, as `(id, label)`.
const STYLES: [(&str, &str); 4] = [
    ("poetique", "Poétique"),
    ("minimal", "Minimaliste"),
    ("onirique", "Onirique"),
    ("conte", "Conte"),
];

/// What the prompt is meant for, as `(id, label)`.
const USAGES: [(&str, &str); 4] = [
    ("therapie", "Médiation / thérapie"),
    ("ecriture", "Atelier d'écriture"),
    ("meditation", "Méditation"),
    ("jeu", "Jeu de mots"),
];

fn catalog_label(catalog: &[(&'static str, &'static str)], id: &str) -> &'static str {
    catalog
        .iter()
        .find(|(candidate, _)| *candidate == id)
        .or_else(|| catalog.first())
        .map_or("", |(_, label)| label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_catalog_id_falls_back_to_first_entry() {
        assert_eq!(catalog_label(&STYLES, "onirique"), "Onirique");
        assert_eq!(catalog_label(&USAGES, "disparu"), "Médiation / thérapie");
        assert_eq!(catalog_label(&[], "x"), "");
    }
}
