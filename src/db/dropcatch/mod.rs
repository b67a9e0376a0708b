pub mod auctions_archive;
