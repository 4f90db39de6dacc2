use rust_xlsxwriter::{Workbook, Worksheet};

use crate::cart::CartItem;
use crate::catalog::Product;
use crate::error::ShopError;

/// Convert the product table to XLSX format
///
/// Writes a header row followed by one row per product, in a format that
/// Microsoft Excel and other spreadsheet applications can open.
///
/// # Arguments
/// * `products` - The catalog rows to export
///
/// # Returns
/// * `Result<Vec<u8>, ShopError>` - XLSX file content as bytes or an error
pub fn products_to_xlsx(products: &[Product]) -> Result<Vec<u8>, ShopError> {
    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();

    write_header(
        &mut worksheet,
        &[
            "Product Name",
            "Product Price",
            "Product Quantity",
            "Product Image",
            "Added By",
            "Seller ID",
        ],
    )?;

    for (r, product) in products.iter().enumerate() {
        let row = (r + 1) as u32;
        worksheet.write_string(row, 0, product.name.as_str())?;
        worksheet.write_number(row, 1, product.price)?;
        worksheet.write_number(row, 2, product.quantity as f64)?;
        worksheet.write_string(row, 3, product.image.as_str())?;
        worksheet.write_string(row, 4, product.added_by.as_str())?;
        worksheet.write_string(row, 5, product.seller_id.to_string().as_str())?;
    }

    workbook.push_worksheet(worksheet);
    let buffer = workbook.save_to_buffer()?;

    Ok(buffer)
}

/// Convert cart rows to XLSX format
///
/// # Arguments
/// * `items` - The cart rows to export (typically one user's rows)
///
/// # Returns
/// * `Result<Vec<u8>, ShopError>` - XLSX file content as bytes or an error
pub fn cart_to_xlsx(items: &[CartItem]) -> Result<Vec<u8>, ShopError> {
    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();

    write_header(
        &mut worksheet,
        &["Product Name", "Quantity", "Cost", "User ID"],
    )?;

    for (r, item) in items.iter().enumerate() {
        let row = (r + 1) as u32;
        worksheet.write_string(row, 0, item.product_name.as_str())?;
        worksheet.write_number(row, 1, item.quantity as f64)?;
        worksheet.write_number(row, 2, item.cost)?;
        worksheet.write_string(row, 3, item.user_id.to_string().as_str())?;
    }

    workbook.push_worksheet(worksheet);
    let buffer = workbook.save_to_buffer()?;

    Ok(buffer)
}

/// Convert the product table to CSV format
///
/// Values containing commas, quotes, or newlines are quoted and escaped.
pub fn products_to_csv(products: &[Product]) -> String {
    let mut csv = String::new();
    push_csv_row(
        &mut csv,
        &[
            "Product Name",
            "Product Price",
            "Product Quantity",
            "Product Image",
            "Added By",
            "Seller ID",
        ],
    );

    for p in products {
        push_csv_row(
            &mut csv,
            &[
                &p.name,
                &p.price.to_string(),
                &p.quantity.to_string(),
                &p.image,
                &p.added_by,
                &p.seller_id.to_string(),
            ],
        );
    }

    csv
}

/// Convert cart rows to CSV format
pub fn cart_to_csv(items: &[CartItem]) -> String {
    let mut csv = String::new();
    push_csv_row(&mut csv, &["Product Name", "Quantity", "Cost", "User ID"]);

    for item in items {
        push_csv_row(
            &mut csv,
            &[
                &item.product_name,
                &item.quantity.to_string(),
                &item.cost.to_string(),
                &item.user_id.to_string(),
            ],
        );
    }

    csv
}

fn write_header(worksheet: &mut Worksheet, headers: &[&str]) -> Result<(), ShopError> {
    for (c, header) in headers.iter().enumerate() {
        worksheet.write_string(0, c as u16, *header)?;
    }
    Ok(())
}

fn push_csv_row(csv: &mut String, fields: &[&str]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            csv.push(',');
        }
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            let escaped = field.replace('"', "\"\"");
            csv.push_str(&format!("\"{}\"", escaped));
        } else {
            csv.push_str(field);
        }
    }
    csv.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn xlsx_buffers_are_not_empty() {
        let products = vec![Product {
            name: "Widget".to_string(),
            price: 5.0,
            quantity: 3,
            image: "w.png".to_string(),
            added_by: "alice".to_string(),
            seller_id: Uuid::new_v4(),
        }];
        assert!(!products_to_xlsx(&products).unwrap().is_empty());

        let items = vec![CartItem {
            product_name: "Widget".to_string(),
            quantity: 2,
            cost: 5.0,
            user_id: Uuid::new_v4(),
        }];
        assert!(!cart_to_xlsx(&items).unwrap().is_empty());
    }

    #[test]
    fn csv_has_header_and_one_line_per_row() {
        let user_id = Uuid::new_v4();
        let items = vec![
            CartItem {
                product_name: "Widget, large".to_string(),
                quantity: 2,
                cost: 5.0,
                user_id,
            },
            CartItem {
                product_name: "Gadget".to_string(),
                quantity: 1,
                cost: 9.5,
                user_id,
            },
        ];

        let csv = cart_to_csv(&items);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Product Name,Quantity,Cost,User ID");
        assert!(lines[1].starts_with("\"Widget, large\",2,5"));
        assert!(lines[2].starts_with("Gadget,1,9.5"));
    }
}
