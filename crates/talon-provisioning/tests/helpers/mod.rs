pub mod mock_panel;
