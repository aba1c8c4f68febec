mod category_handler;

pub use category_handler::{
    __path_create_category, __path_delete_category, __path_get_category,
    __path_get_category_path, __path_get_category_tree, __path_list_categories,
    __path_list_category_ancestors, __path_list_category_children,
    __path_list_category_descendants, __path_list_hierarchy_options, __path_update_category,
    create_category, delete_category, get_category, get_category_path, get_category_tree,
    list_categories, list_category_ancestors, list_category_children,
    list_category_descendants, list_hierarchy_options, update_category,
};
