mod helpers;
mod list;
mod photo;
mod product;
mod transfer;

pub(crate) use list::{cmd_list, cmd_total};
pub(crate) use photo::cmd_image;
pub(crate) use product::{cmd_add, cmd_delete, cmd_edit, cmd_show};
pub(crate) use transfer::{cmd_export, cmd_import};
