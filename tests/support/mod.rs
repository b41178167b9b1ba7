pub mod mock_pages;
