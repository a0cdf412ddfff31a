//! Catalog filtering, sorting and grid layout state.
//!
//! The catalog and drop pages read these from the query string
//! (`?filter=sale&sort=price-asc&view=2col`) so that every view is a plain
//! shareable URL.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::drop::Drop;
use crate::product::Product;
use crate::types::DropId;

/// What the catalog is narrowed to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CatalogFilter {
    #[default]
    All,
    Sale,
    New,
    Category(String),
    Drop(DropId),
}

impl CatalogFilter {
    /// Interpret a query value. Known drop ids become [`CatalogFilter::Drop`],
    /// unknown values are treated as category slugs.
    #[must_use]
    pub fn parse(value: &str, drops: &[Drop]) -> Self {
        match value.trim() {
            "" | "all" => Self::All,
            "sale" => Self::Sale,
            "new" => Self::New,
            v if drops.iter().any(|d| d.id.as_str() == v) => Self::Drop(DropId::new(v)),
            v => Self::Category(v.to_owned()),
        }
    }

    /// Query value for this filter.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::All => "all",
            Self::Sale => "sale",
            Self::New => "new",
            Self::Category(slug) => slug,
            Self::Drop(id) => id.as_str(),
        }
    }

    /// Whether a product passes the filter.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        match self {
            Self::All => true,
            Self::Sale => product.is_sale,
            Self::New => product.is_new,
            Self::Category(slug) => &product.cat == slug,
            Self::Drop(id) => &product.drop == id,
        }
    }

    /// Where selecting this filter navigates instead of filtering in place.
    ///
    /// Drop filters open the drop's landing page.
    #[must_use]
    pub fn route(&self) -> Option<String> {
        match self {
            Self::Drop(id) => Some(format!("/drops/{id}")),
            _ => None,
        }
    }
}

/// A selectable filter chip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOption {
    pub label: String,
    pub value: String,
}

impl FilterOption {
    fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Base filters followed by one entry per drop.
#[must_use]
pub fn filter_options(drops: &[Drop]) -> Vec<FilterOption> {
    let mut options = vec![
        FilterOption::new("Ver todo", "all"),
        FilterOption::new("T-Shirts", "tshirts"),
        FilterOption::new("Hoodies", "hoodies"),
        FilterOption::new("Sale", "sale"),
    ];
    options.extend(
        drops
            .iter()
            .map(|d| FilterOption::new(d.filter_label(), d.id.as_str())),
    );
    options
}

/// Filters shown on a drop landing page: back to everything, then the drops.
#[must_use]
pub fn drop_page_filter_options(drops: &[Drop]) -> Vec<FilterOption> {
    let mut options = vec![FilterOption::new("Ver todo", "all")];
    options.extend(
        drops
            .iter()
            .map(|d| FilterOption::new(d.filter_label(), d.id.as_str())),
    );
    options
}

/// Destination of a filter chip on a drop landing page.
///
/// Drop filters open that drop's page; anything else returns to the catalog.
#[must_use]
pub fn drop_route(filter: &CatalogFilter) -> String {
    filter.route().unwrap_or_else(|| "/catalog".to_owned())
}

/// Catalog ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    /// New arrivals first, otherwise backend order.
    #[default]
    #[serde(rename = "new")]
    New,
    #[serde(rename = "price-asc")]
    PriceAsc,
    #[serde(rename = "price-desc")]
    PriceDesc,
    #[serde(rename = "discount")]
    Discount,
}

impl SortOrder {
    pub const ALL: [Self; 4] = [Self::New, Self::PriceAsc, Self::PriceDesc, Self::Discount];

    #[must_use]
    pub const fn value(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::Discount => "discount",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::New => "Novedades",
            Self::PriceAsc => "Precio: menor",
            Self::PriceDesc => "Precio: mayor",
            Self::Discount => "% Descuento",
        }
    }

    /// Sort in place. All orderings are stable.
    pub fn apply(self, products: &mut [Product]) {
        match self {
            Self::New => products.sort_by_key(|p| !p.is_new),
            Self::PriceAsc => products.sort_by(|a, b| a.price.cmp(&b.price)),
            Self::PriceDesc => products.sort_by(|a, b| b.price.cmp(&a.price)),
            Self::Discount => {
                products.sort_by_key(|p| core::cmp::Reverse(p.sale_discount()));
            }
        }
    }
}

impl FromStr for SortOrder {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|o| o.value() == s).ok_or(())
    }
}

/// Catalog grid density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GridView {
    #[serde(rename = "2col")]
    TwoCol,
    #[default]
    #[serde(rename = "4col")]
    FourCol,
}

impl GridView {
    #[must_use]
    pub const fn value(self) -> &'static str {
        match self {
            Self::TwoCol => "2col",
            Self::FourCol => "4col",
        }
    }
}

impl FromStr for GridView {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "2col" => Ok(Self::TwoCol),
            "4col" => Ok(Self::FourCol),
            _ => Err(()),
        }
    }
}

/// Products that pass `filter`, ordered by `sort`.
#[must_use]
pub fn visible_products(products: &[Product], filter: &CatalogFilter, sort: SortOrder) -> Vec<Product> {
    let mut list: Vec<Product> = products.iter().filter(|p| filter.matches(p)).cloned().collect();
    sort.apply(&mut list);
    list
}

/// Filters for the backend's `GET /products`.
///
/// `None` means "all"; such parameters are left off the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ProductQuery {
    pub drop: Option<DropId>,
    pub cat: Option<String>,
}

impl ProductQuery {
    /// Products belonging to one drop.
    #[must_use]
    pub const fn for_drop(drop: DropId) -> Self {
        Self {
            drop: Some(drop),
            cat: None,
        }
    }

    /// Query-string pairs, skipping unset and `"all"` values.
    #[must_use]
    pub fn params(&self) -> Vec<(&'static str, &str)> {
        let mut params = Vec::with_capacity(2);
        if let Some(drop) = self
            .drop
            .as_ref()
            .filter(|d| !d.as_str().is_empty() && d.as_str() != "all")
        {
            params.push(("drop", drop.as_str()));
        }
        if let Some(cat) = self.cat.as_deref().filter(|c| !c.is_empty() && *c != "all") {
            params.push(("cat", cat));
        }
        params
    }

    /// Whether no filter applies.
    #[must_use]
    pub fn is_unfiltered(&self) -> bool {
        self.params().is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::drop::tests::drop;
    use crate::product::tests::product;

    fn ids(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.id.as_str()).collect()
    }

    fn sample() -> Vec<Product> {
        let a = product("a", 30_000, 30_000);
        let mut b = product("b", 20_000, 40_000);
        b.is_sale = true;
        b.is_new = true;
        let mut c = product("c", 45_000, 50_000);
        c.cat = "hoodies".to_owned();
        c.drop = DropId::new("drop02");
        let mut d = product("d", 10_000, 10_000);
        d.is_new = true;
        vec![a, b, c, d]
    }

    #[test]
    fn test_parse_filter() {
        let drops = vec![drop("drop01", "01", "2026-01-01", true)];
        assert_eq!(CatalogFilter::parse("all", &drops), CatalogFilter::All);
        assert_eq!(CatalogFilter::parse("", &drops), CatalogFilter::All);
        assert_eq!(CatalogFilter::parse("sale", &drops), CatalogFilter::Sale);
        assert_eq!(
            CatalogFilter::parse("drop01", &drops),
            CatalogFilter::Drop(DropId::new("drop01"))
        );
        assert_eq!(
            CatalogFilter::parse("hoodies", &drops),
            CatalogFilter::Category("hoodies".to_owned())
        );
    }

    #[test]
    fn test_filters() {
        let products = sample();
        let sort = SortOrder::PriceAsc;
        assert_eq!(ids(&visible_products(&products, &CatalogFilter::Sale, sort)), ["b"]);
        assert_eq!(ids(&visible_products(&products, &CatalogFilter::New, sort)), ["d", "b"]);
        assert_eq!(
            ids(&visible_products(
                &products,
                &CatalogFilter::Category("hoodies".to_owned()),
                sort
            )),
            ["c"]
        );
        assert_eq!(
            ids(&visible_products(
                &products,
                &CatalogFilter::Drop(DropId::new("drop02")),
                sort
            )),
            ["c"]
        );
    }

    #[test]
    fn test_sort_new_is_stable() {
        let products = sample();
        let sorted = visible_products(&products, &CatalogFilter::All, SortOrder::New);
        assert_eq!(ids(&sorted), ["b", "d", "a", "c"]);
    }

    #[test]
    fn test_sort_by_price() {
        let products = sample();
        assert_eq!(
            ids(&visible_products(&products, &CatalogFilter::All, SortOrder::PriceAsc)),
            ["d", "b", "a", "c"]
        );
        assert_eq!(
            ids(&visible_products(&products, &CatalogFilter::All, SortOrder::PriceDesc)),
            ["c", "a", "b", "d"]
        );
    }

    #[test]
    fn test_sort_by_discount() {
        let mut products = sample();
        let sorted = visible_products(&products, &CatalogFilter::All, SortOrder::Discount);
        assert_eq!(ids(&sorted), ["b", "a", "c", "d"]);
        assert_eq!(sorted[0].price, Decimal::from(20_000));

        // A stale original price does not outrank a real sale
        products[2].original_price = Decimal::from(450_000);
        let sorted = visible_products(&products, &CatalogFilter::All, SortOrder::Discount);
        assert_eq!(ids(&sorted), ["b", "a", "c", "d"]);

        products[2].is_sale = true;
        let sorted = visible_products(&products, &CatalogFilter::All, SortOrder::Discount);
        assert_eq!(ids(&sorted), ["c", "b", "a", "d"]);
    }

    #[test]
    fn test_filter_options_append_drops() {
        let drops = vec![
            drop("drop01", "01", "2026-01-01", true),
            drop("drop02", "02", "2026-02-01", true),
        ];
        let options = filter_options(&drops);
        assert_eq!(options.len(), 6);
        assert_eq!(options[4].label, "Drop 01");
        assert_eq!(options[5].value, "drop02");
        assert_eq!(drop_page_filter_options(&drops).len(), 3);
    }

    #[test]
    fn test_drop_filter_routes_to_landing() {
        assert_eq!(
            CatalogFilter::Drop(DropId::new("drop03")).route().as_deref(),
            Some("/drops/drop03")
        );
        assert_eq!(CatalogFilter::Sale.route(), None);
        assert_eq!(drop_route(&CatalogFilter::All), "/catalog");
        assert_eq!(
            drop_route(&CatalogFilter::Drop(DropId::new("drop01"))),
            "/drops/drop01"
        );
    }

    #[test]
    fn test_sort_and_view_parse() {
        assert_eq!("price-desc".parse::<SortOrder>(), Ok(SortOrder::PriceDesc));
        assert!("cheapest".parse::<SortOrder>().is_err());
        assert_eq!("2col".parse::<GridView>(), Ok(GridView::TwoCol));
        assert_eq!(GridView::default().value(), "4col");
    }

    #[test]
    fn test_product_query_params_skip_all_and_empty() {
        assert!(ProductQuery::default().is_unfiltered());

        let query = ProductQuery {
            drop: Some(DropId::new("all")),
            cat: Some("all".to_owned()),
        };
        assert!(query.params().is_empty());

        let query = ProductQuery {
            drop: Some(DropId::new("drop02")),
            cat: Some("hoodies".to_owned()),
        };
        assert_eq!(query.params(), [("drop", "drop02"), ("cat", "hoodies")]);
        assert_eq!(
            ProductQuery::for_drop(DropId::new("drop01")).params(),
            [("drop", "drop01")]
        );
    }
}
