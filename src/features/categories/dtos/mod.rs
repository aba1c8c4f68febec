mod category_dto;

pub use category_dto::{
    CategoryDetailDto, CategoryListItemDto, CategoryPayloadDto, CategoryRefDto,
    CategoryResponseDto, CategoryTreeDto, HierarchyOptionDto,
};
