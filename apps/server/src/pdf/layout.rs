//! Receipt layouts.
//!
//! ```text
//! default   A4     logo + company | number, date | recipient | items | totals
//! compact   80mm   centred header, one line per item, height follows items
//! standard  A4     title, parties, items table, totals, signature, footer
//! ```

use chrono::{DateTime, Utc};

use orderdesk_core::money::Money;
use orderdesk_core::types::{Order, OrderItem, Recipient, ReceiptVariant};

use super::{mm, Document, Page, PdfResult, RgbImage, Typeface, Weight, A4_HEIGHT, A4_WIDTH};

/// Company name and logo printed in the header.
#[derive(Debug, Clone, Default)]
pub struct Branding {
    pub company_name: String,
    pub logo: Option<RgbImage>,
}

impl Branding {
    fn display_name(&self) -> &str {
        let name = self.company_name.trim();
        if name.is_empty() {
            "OrderDesk"
        } else {
            name
        }
    }
}

/// What a receipt shows.
#[derive(Debug, Clone, Copy)]
pub struct ReceiptView<'a> {
    pub number: &'a str,
    pub issued_at: DateTime<Utc>,
    pub order: &'a Order,
    pub recipient: &'a Recipient,
    pub items: &'a [OrderItem],
}

impl ReceiptView<'_> {
    fn money(&self, cents: i64) -> String {
        Money::from_cents(cents).format_with(self.order.currency)
    }

    fn issued(&self) -> String {
        self.issued_at.format("%d.%m.%Y %H:%M").to_string()
    }
}

/// Renders `view` with the given layout.
pub fn render(variant: ReceiptVariant, view: &ReceiptView<'_>, branding: &Branding) -> PdfResult<Vec<u8>> {
    let font = Typeface::bundled()?;
    let mut doc = Document::new(&font);
    if let Some(logo) = &branding.logo {
        doc.set_image(logo.clone());
    }

    match variant {
        ReceiptVariant::Default => render_default(&mut doc, view, branding),
        ReceiptVariant::Compact => render_compact(&mut doc, view, branding),
        ReceiptVariant::Standard => render_standard(&mut doc, view, branding),
    }

    Ok(doc.finish())
}

// =============================================================================
// A4 helpers
// =============================================================================

const MARGIN: f32 = 50.0;
const BOTTOM: f32 = 70.0;
const ROW: f32 = 18.0;

/// Column x positions of the A4 items table.
struct Columns {
    name: f32,
    qty_right: f32,
    price_right: f32,
    total_right: f32,
}

const A4_COLUMNS: Columns = Columns {
    name: MARGIN,
    qty_right: 350.0,
    price_right: 450.0,
    total_right: A4_WIDTH - MARGIN,
};

/// A4 pages with a running cursor; starts a new page when a row won't fit.
struct Flow<'d, 'f> {
    doc: &'d mut Document<'f>,
    page: Page<'f>,
    y: f32,
}

impl<'d, 'f> Flow<'d, 'f> {
    fn new(doc: &'d mut Document<'f>) -> Self {
        let page = doc.page(A4_WIDTH, A4_HEIGHT);
        Flow {
            doc,
            page,
            y: A4_HEIGHT - MARGIN,
        }
    }

    fn ensure(&mut self, needed: f32) -> bool {
        if self.y - needed >= BOTTOM {
            return false;
        }
        let next = self.doc.page(A4_WIDTH, A4_HEIGHT);
        let full = std::mem::replace(&mut self.page, next);
        self.doc.push_page(full);
        self.y = A4_HEIGHT - MARGIN;
        true
    }

    fn finish(self) {
        self.doc.push_page(self.page);
    }
}

/// Draws the logo into a box at the top-left, returning the height used.
fn draw_logo(page: &mut Page<'_>, doc_image: Option<(u32, u32)>, x: f32, top: f32, max_w: f32, max_h: f32) -> f32 {
    let Some((w, h)) = doc_image else {
        return 0.0;
    };
    let scale = (max_w / w as f32).min(max_h / h as f32);
    let (dw, dh) = (w as f32 * scale, h as f32 * scale);
    page.image(x, top - dh, dw, dh);
    dh
}

fn table_header(flow: &mut Flow<'_, '_>) {
    let c = &A4_COLUMNS;
    flow.page.fill_rect(MARGIN - 4.0, flow.y - 6.0, A4_WIDTH - 2.0 * MARGIN + 8.0, ROW, 0.92);
    flow.page.text(c.name, flow.y, 10.0, Weight::Bold, "Item");
    flow.page.text_right(c.qty_right, flow.y, 10.0, Weight::Bold, "Qty");
    flow.page.text_right(c.price_right, flow.y, 10.0, Weight::Bold, "Price");
    flow.page.text_right(c.total_right, flow.y, 10.0, Weight::Bold, "Total");
    flow.y -= ROW + 4.0;
}

fn items_table(flow: &mut Flow<'_, '_>, view: &ReceiptView<'_>) {
    let c = &A4_COLUMNS;
    table_header(flow);

    for item in view.items {
        if flow.ensure(ROW) {
            table_header(flow);
        }
        let name = flow.page.fit_text(&item.product_name, c.qty_right - c.name - 60.0, 10.0);
        flow.page.text(c.name, flow.y, 10.0, Weight::Regular, &name);
        flow.page.text_right(c.qty_right, flow.y, 10.0, Weight::Regular, &item.qty.to_string());
        flow.page.text_right(c.price_right, flow.y, 10.0, Weight::Regular, &view.money(item.unit_price_cents));
        flow.page.text_right(c.total_right, flow.y, 10.0, Weight::Regular, &view.money(item.line_total_cents));
        flow.y -= ROW;
    }

    flow.page.line(MARGIN, flow.y + ROW - 6.0, A4_WIDTH - MARGIN, flow.y + ROW - 6.0, 0.5);
}

fn totals(flow: &mut Flow<'_, '_>, view: &ReceiptView<'_>) {
    let right = A4_COLUMNS.total_right;
    let label = A4_COLUMNS.price_right;
    flow.ensure(ROW * 3.0);
    flow.y -= 6.0;

    flow.page.text_right(label, flow.y, 10.0, Weight::Regular, "Subtotal:");
    flow.page.text_right(right, flow.y, 10.0, Weight::Regular, &view.money(view.order.subtotal_cents));
    flow.y -= ROW;
    flow.page.text_right(label, flow.y, 12.0, Weight::Bold, "Total:");
    flow.page.text_right(right, flow.y, 12.0, Weight::Bold, &view.money(view.order.total_cents));
    flow.y -= ROW * 1.5;
}

fn recipient_block(flow: &mut Flow<'_, '_>, title: &str, recipient: &Recipient) {
    flow.page.text(MARGIN, flow.y, 11.0, Weight::Bold, title);
    flow.y -= 15.0;
    flow.page.text(MARGIN, flow.y, 10.0, Weight::Regular, &recipient.name);
    flow.y -= 14.0;
    for line in [&recipient.email, &recipient.phone, &recipient.address]
        .into_iter()
        .flatten()
        .filter(|l| !l.trim().is_empty())
    {
        flow.page.text(MARGIN, flow.y, 10.0, Weight::Regular, line);
        flow.y -= 14.0;
    }
    flow.y -= 10.0;
}

// =============================================================================
// default
// =============================================================================

fn render_default(doc: &mut Document<'_>, view: &ReceiptView<'_>, branding: &Branding) {
    let logo = doc.image_size();
    let mut flow = Flow::new(doc);

    let top = flow.y;
    let logo_h = draw_logo(&mut flow.page, logo, MARGIN, top, 120.0, 60.0);
    let name_x = if logo_h > 0.0 { MARGIN + 135.0 } else { MARGIN };
    flow.page.text(name_x, top - 18.0, 16.0, Weight::Bold, branding.display_name());

    let right = A4_WIDTH - MARGIN;
    flow.page.text_right(right, top - 12.0, 14.0, Weight::Bold, "RECEIPT");
    flow.page.text_right(right, top - 30.0, 10.0, Weight::Regular, &format!("No. {}", view.number));
    flow.page.text_right(right, top - 44.0, 10.0, Weight::Regular, &format!("Date: {}", view.issued()));

    flow.y = top - logo_h.max(50.0) - 20.0;
    flow.page.line(MARGIN, flow.y + 8.0, right, flow.y + 8.0, 1.0);
    flow.y -= 14.0;

    recipient_block(&mut flow, "Bill to", view.recipient);
    items_table(&mut flow, view);
    totals(&mut flow, view);

    flow.finish();
}

// =============================================================================
// compact
// =============================================================================

const COMPACT_WIDTH_MM: f32 = 80.0;
const COMPACT_LINE: f32 = 12.0;

fn render_compact(doc: &mut Document<'_>, view: &ReceiptView<'_>, branding: &Branding) {
    let width = mm(COMPACT_WIDTH_MM);
    let margin = mm(4.0);
    let center = width / 2.0;
    let right = width - margin;

    let logo = doc.image_size();
    let logo_h = if logo.is_some() { 40.0 } else { 0.0 };
    // header + recipient + separators + totals, then two lines per item
    let height = 150.0 + logo_h + view.items.len() as f32 * COMPACT_LINE * 2.0;

    let mut page = doc.page(width, height);
    let mut y = height - margin;

    if let Some((w, h)) = logo {
        let scale = (100.0 / w as f32).min(logo_h / h as f32);
        let (dw, dh) = (w as f32 * scale, h as f32 * scale);
        page.image(center - dw / 2.0, y - dh, dw, dh);
        y -= logo_h + 6.0;
    }

    y -= 10.0;
    let company = page.fit_text(branding.display_name(), width - 2.0 * margin, 11.0);
    page.text_center(center, y, 11.0, Weight::Bold, &company);
    y -= COMPACT_LINE + 2.0;
    page.text_center(center, y, 8.0, Weight::Regular, &format!("Receipt {}", view.number));
    y -= COMPACT_LINE - 2.0;
    page.text_center(center, y, 8.0, Weight::Regular, &view.issued());
    y -= COMPACT_LINE - 2.0;
    let recipient = page.fit_text(&view.recipient.name, width - 2.0 * margin, 8.0);
    page.text_center(center, y, 8.0, Weight::Regular, &recipient);
    y -= 6.0;
    page.line(margin, y, right, y, 0.5);
    y -= COMPACT_LINE;

    for item in view.items {
        let name = page.fit_text(&item.product_name, width - 2.0 * margin, 8.0);
        page.text(margin, y, 8.0, Weight::Regular, &name);
        y -= COMPACT_LINE - 2.0;
        let qty = format!("{} x {}", item.qty, view.money(item.unit_price_cents));
        page.text(margin + 6.0, y, 8.0, Weight::Regular, &qty);
        page.text_right(right, y, 8.0, Weight::Regular, &view.money(item.line_total_cents));
        y -= COMPACT_LINE + 2.0;
    }

    page.line(margin, y + 6.0, right, y + 6.0, 0.5);
    y -= 6.0;
    page.text(margin, y, 10.0, Weight::Bold, "TOTAL");
    page.text_right(right, y, 10.0, Weight::Bold, &view.money(view.order.total_cents));
    y -= COMPACT_LINE + 4.0;
    page.text_center(center, y, 7.0, Weight::Regular, "Thank you!");

    doc.push_page(page);
}

// =============================================================================
// standard
// =============================================================================

fn render_standard(doc: &mut Document<'_>, view: &ReceiptView<'_>, branding: &Branding) {
    let logo = doc.image_size();
    let mut flow = Flow::new(doc);
    let right = A4_WIDTH - MARGIN;

    let top = flow.y;
    let logo_h = draw_logo(&mut flow.page, logo, right - 100.0, top, 100.0, 50.0);
    flow.page.text(MARGIN, top - 20.0, 22.0, Weight::Bold, &format!("Receipt No. {}", view.number));
    flow.page.text(MARGIN, top - 40.0, 10.0, Weight::Regular, &format!("Issued {}", view.issued()));

    flow.y = top - logo_h.max(50.0) - 24.0;

    flow.page.text(MARGIN, flow.y, 11.0, Weight::Bold, "Seller");
    flow.y -= 15.0;
    flow.page.text(MARGIN, flow.y, 10.0, Weight::Regular, branding.display_name());
    flow.y -= 24.0;
    recipient_block(&mut flow, "Buyer", view.recipient);

    items_table(&mut flow, view);
    totals(&mut flow, view);

    flow.ensure(80.0);
    flow.y -= 30.0;
    flow.page.line(MARGIN, flow.y, MARGIN + 200.0, flow.y, 0.75);
    flow.page.text(MARGIN, flow.y - 12.0, 8.0, Weight::Regular, "Signature");
    flow.page.line(right - 150.0, flow.y, right, flow.y, 0.75);
    flow.page.text(right - 150.0, flow.y - 12.0, 8.0, Weight::Regular, "Date");

    let footer = format!("{} | Receipt {} | Order {}", branding.display_name(), view.number, view.order.id);
    flow.page.text_center(A4_WIDTH / 2.0, 30.0, 7.0, Weight::Regular, &footer);

    flow.finish();
}
