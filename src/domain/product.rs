/// Product lines offered on the entry form. Entries may still name
/// products outside this list.
pub const PRODUCT_CATALOG: &[&str] = &[
    "disposable beverage packages",
    "disposable bottled water packages",
    "disposable peanut butter packages",
    "disposable blue band butter packages",
    "disposable tomato sauce",
    "disposable food spices",
    "disposable mayonnaise packages",
    "disposable vinegar packages",
    "disposable canned food packages",
    "disposable sachet water packages",
    "disposable mealie meal packages",
    "disposable cooking oil packages",
    "disposable flour packages",
    "disposable sugar packages",
    "disposable shoe polish packages",
    "disposable floor polish packages",
    "disposable tooth brushes",
    "disposable liquor packages",
    "disposable cosmetics/body deodorant",
    "disposable cleaning agents",
    "disposable pharmaceutical packages",
    "disposable animal feed packages",
    "disposable fertilizer packages",
    "disposable insecticides packages",
    "disposable farm seeds packages",
    "disposable vehicle tyres",
    "disposable bicycle tyres",
    "disposable motorbike tyres",
    "disposable plastic bags",
    "disposable Coca cola",
    "disposable Minute Maid",
    "disposable malt drink",
];

pub fn is_catalog_product(name: &str) -> bool {
    PRODUCT_CATALOG
        .iter()
        .any(|product| product.eq_ignore_ascii_case(name.trim()))
}
